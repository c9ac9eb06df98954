// src/noyau/oracle.rs
//
// Oracle haute précision : “π à N chiffres”, vu comme une boîte noire.
// - trait OraclePi : seule opération exposée au reste du noyau
// - OracleEntier  : Machin sur entiers scalés (×10^(N+extra)), troncature ;
//   seul le plus long développement est gardé, les demandes plus courtes en
//   sont des préfixes (troncature)
//
// Une demande trop grosse est refusée (OracleIndisponible) plutôt que de
// laisser le processus épuiser la mémoire.

use num_bigint::BigInt;
use num_traits::Zero;
use std::sync::Mutex;
use tracing::{info, warn};

use super::decimal::puissance_dix;
use super::erreur::ErreurPi;
use super::flux::{Bilan, PuitsChiffres, Requete};

/// Chiffres de garde ajoutés au calcul scalé puis retirés.
const EXTRA: usize = 10;

pub trait OraclePi {
    /// π sous la forme "3.xxxx" avec exactement `chiffres` chiffres après la virgule.
    fn calcule_pi(&self, chiffres: usize) -> Result<String, ErreurPi>;
}

#[derive(Debug)]
pub struct OracleEntier {
    limite: usize,
    /// Plus long développement calculé ("3.xxxx").
    cache: Mutex<Option<String>>,
}

impl OracleEntier {
    pub fn new(limite: usize) -> Self {
        Self {
            limite,
            cache: Mutex::new(None),
        }
    }
}

/// arctan(1/q) × scale (troncature) :
/// atan(z) = z − z³/3 + z⁵/5 − …
fn arctan_inv_q_scaled(q: u32, scale: &BigInt) -> BigInt {
    let q2 = BigInt::from(q) * q;

    // scale / q^(2k+1)
    let mut puissance = scale / q;
    let mut k: u64 = 0;
    let mut somme = BigInt::zero();

    while !puissance.is_zero() {
        let terme = &puissance / (2 * k + 1);
        if k % 2 == 0 {
            somme += &terme;
        } else {
            somme -= &terme;
        }
        puissance /= &q2;
        k += 1;
    }

    somme
}

fn pi_scaled(chiffres: usize) -> Result<BigInt, ErreurPi> {
    let scale = puissance_dix(chiffres + EXTRA)?;

    let a = arctan_inv_q_scaled(5, &scale);
    let b = arctan_inv_q_scaled(239, &scale);

    let pi = (a * 4u32 - b) * 4u32;
    Ok(pi / puissance_dix(EXTRA)?)
}

impl OracleEntier {
    fn depuis_cache(&self, chiffres: usize) -> Option<String> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .as_deref()
            .filter(|c| c.len() >= chiffres + 2)
            .map(|c| prefixe(c, chiffres))
    }
}

/// "3." + `chiffres` décimales de `texte` ("3" seul pour 0).
fn prefixe(texte: &str, chiffres: usize) -> String {
    if chiffres == 0 {
        texte[..1].to_string()
    } else {
        texte[..chiffres + 2].to_string()
    }
}

impl OraclePi for OracleEntier {
    fn calcule_pi(&self, chiffres: usize) -> Result<String, ErreurPi> {
        if chiffres > self.limite {
            warn!(chiffres, limite = self.limite, "oracle : demande refusée");
            return Err(ErreurPi::OracleIndisponible(format!(
                "mémoire insuffisante pour {chiffres} chiffres (limite {})",
                self.limite
            )));
        }

        if let Some(deja) = self.depuis_cache(chiffres) {
            return Ok(deja);
        }

        // calcul hors verrou
        let brut = pi_scaled(chiffres)?.to_str_radix(10);
        let (ent, frac) = brut.split_at(1);
        let texte = format!("{ent}.{frac}");

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if cache.as_ref().map_or(true, |c| c.len() < texte.len()) {
            *cache = Some(texte.clone());
        }
        Ok(prefixe(&texte, chiffres))
    }
}

/// Méthode “oracle” : π calculé d’un bloc puis poussé caractère par caractère.
pub fn flux_oracle(
    oracle: &dyn OraclePi,
    chiffres: usize,
    req: &Requete,
    puits: &mut impl PuitsChiffres,
) -> Result<Bilan, ErreurPi> {
    info!(chiffres, "oracle : début");
    let texte = oracle.calcule_pi(chiffres)?;

    let mut emis: u64 = 0;
    let mut annule = false;
    for (i, c) in texte.chars().enumerate() {
        puits.ajoute(c.encode_utf8(&mut [0u8; 4]));
        if i >= 2 {
            emis += 1;
        }
        if req.interrompue() {
            annule = true;
            break;
        }
    }

    info!(chiffres = emis, annule, "oracle : fin");
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
    fn trente_chiffres() {
        let o = OracleEntier::new(1000);
        assert_eq!(
            o.calcule_pi(30).unwrap(),
            "3.141592653589793238462643383279"
        );
    }

    #[test]
    fn longueur_exacte() {
        let o = OracleEntier::new(1000);
        let s = o.calcule_pi(500).unwrap();
        assert_eq!(s.len(), 502);
        // deuxième appel : cache, même résultat
        assert_eq!(o.calcule_pi(500).unwrap(), s);
    }

    #[test]
    fn demande_courte_servie_par_prefixe() {
        let o = OracleEntier::new(1000);
        let long = o.calcule_pi(200).unwrap();
        assert_eq!(o.calcule_pi(20).unwrap(), OracleEntier::new(1000).calcule_pi(20).unwrap());
        assert_eq!(o.calcule_pi(20).unwrap(), long[..22]);
        assert_eq!(o.calcule_pi(0).unwrap(), "3");

        // un seul développement gardé : le plus long
        o.calcule_pi(50).unwrap();
        assert_eq!(o.cache.lock().unwrap().as_deref(), Some(long.as_str()));
        let plus_long = o.calcule_pi(300).unwrap();
        assert_eq!(o.cache.lock().unwrap().as_deref(), Some(plus_long.as_str()));
    }

    #[test]
    fn refus_au_dela_de_la_limite() {
        let o = OracleEntier::new(100);
        assert!(matches!(
            o.calcule_pi(101),
            Err(ErreurPi::OracleIndisponible(_))
        ));
    }

    #[test]
    fn flux_complet() {
        let o = OracleEntier::new(100);
        let mut s = String::new();
        let bilan = flux_oracle(&o, 12, &Requete::new(Cible::Infini), &mut s).unwrap();
        assert_eq!(s, "3.141592653589");
        assert_eq!(bilan.chiffres, 12);
    }
}
