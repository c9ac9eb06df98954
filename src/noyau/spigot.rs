// src/noyau/spigot.rs
//
// Spigot de Rabinowitz–Wagon (forme en flux).
// Entiers exacts uniquement : aucun arrondi, donc aucun chiffre émis n’est jamais révisé.
// C’est le générateur de référence pour les tests.

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use tracing::{debug, info};

use super::erreur::ErreurPi;
use super::flux::{Bilan, PuitsChiffres, Requete};

/// floor(a / b) (la division de BigInt tronque vers zéro).
fn div_floor(a: &BigInt, b: &BigInt) -> BigInt {
    let q = a / b;
    if !(a % b).is_zero() && (a.is_negative() != b.is_negative()) {
        q - 1u32
    } else {
        q
    }
}

/// État de la récurrence : (q, r, t) + (k, n, l).
#[derive(Clone, Debug)]
pub struct Spigot {
    q: BigInt,
    r: BigInt,
    t: BigInt,
    k: BigInt,
    n: BigInt,
    l: BigInt,
}

impl Default for Spigot {
    fn default() -> Self {
        Self {
            q: BigInt::one(),
            r: BigInt::zero(),
            t: BigInt::one(),
            k: BigInt::one(),
            n: BigInt::from(3),
            l: BigInt::from(3),
        }
    }
}

impl Spigot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Un pas : Some(chiffre) si `n` est sûr, None si la récurrence avance seulement.
    pub fn pas(&mut self) -> Result<Option<u8>, ErreurPi> {
        let quatre_q = &self.q * 4u32;
        if quatre_q + &self.r - &self.t < &self.n * &self.t {
            let chiffre = self
                .n
                .to_u8()
                .filter(|c| *c <= 9)
                .ok_or_else(|| {
                    ErreurPi::DepassementArithmetique(format!("chiffre spigot {}", self.n))
                })?;

            let nr = (&self.r - &self.n * &self.t) * 10u32;
            let num = (&self.q * 3u32 + &self.r) * 10u32;
            self.n = div_floor(&num, &self.t) - &self.n * 10u32;
            self.q *= 10u32;
            self.r = nr;
            Ok(Some(chiffre))
        } else {
            let nr = (&self.q * 2u32 + &self.r) * &self.l;
            let num = &self.q * &self.k * 7u32 + 2u32 + &self.r * &self.l;
            let nn = div_floor(&num, &(&self.t * &self.l));
            self.q *= &self.k;
            self.t *= &self.l;
            self.l += 2u32;
            self.k += 1u32;
            self.n = nn;
            self.r = nr;
            Ok(None)
        }
    }

    /// Avance jusqu’au prochain chiffre émis.
    pub fn chiffre_suivant(&mut self) -> Result<u8, ErreurPi> {
        loop {
            if let Some(c) = self.pas()? {
                return Ok(c);
            }
        }
    }
}

/// Générateur spigot : “3.” puis un chiffre par émission.
/// Chaque émission est un point de suspension (annulation possible).
pub fn spigot(req: &Requete, puits: &mut impl PuitsChiffres) -> Result<Bilan, ErreurPi> {
    info!(cible = ?req.cible, "Spigot : début");

    let mut etat = Spigot::new();

    // premier chiffre, suivi immédiatement de la virgule
    let premier = etat.chiffre_suivant()?;
    puits.ajoute(&format!("{premier}."));

    let mut emis: u64 = 0;
    let mut annule = false;

    while !req.cible.atteinte(emis) {
        let c = etat.chiffre_suivant()?;
        puits.ajoute(&c.to_string());
        emis += 1;

        if emis % 1000 == 0 {
            debug!(emis, "Spigot : progression");
        }
        if req.cible.atteinte(emis) {
            break;
        }
        if req.interrompue() {
            annule = true;
            break;
        }
    }

    info!(chiffres = emis, annule, "Spigot : fin");
    Ok(Bilan {
        chiffres: emis,
        annule,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::flux::Cible;

    #[test]
    fn vingt_chiffres() {
        let mut s = String::new();
        let bilan = spigot(&Requete::new(Cible::Chiffres(20)), &mut s).unwrap();
        assert_eq!(bilan.chiffres, 20);
        assert_eq!(s, "3.14159265358979323846");
    }

    #[test]
    fn prefixe_strict() {
        let mut court = String::new();
        let mut long = String::new();
        spigot(&Requete::new(Cible::Chiffres(37)), &mut court).unwrap();
        spigot(&Requete::new(Cible::Chiffres(120)), &mut long).unwrap();
        assert!(long.starts_with(&court));
        assert!(long.len() > court.len());
    }

    #[test]
    fn division_plancher() {
        let f = |a: i64, b: i64| div_floor(&BigInt::from(a), &BigInt::from(b));
        assert_eq!(f(7, 2), BigInt::from(3));
        assert_eq!(f(-7, 2), BigInt::from(-4));
        assert_eq!(f(-6, 2), BigInt::from(-3));
    }

    #[test]
    fn premier_chiffre_puis_virgule() {
        let req = Requete::new(Cible::Infini);
        req.annulation.annule();
        let mut s = String::new();
        let bilan = spigot(&req, &mut s).unwrap();
        assert!(bilan.annule);
        assert_eq!(s, "3.1");
    }
}
