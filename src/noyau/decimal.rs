// src/noyau/decimal.rs
//
// Décimal à précision contrôlée par l’appelant.
// - valeur = mantisse × 10^exposant (mantisse entière exacte)
// - chaque opération arrondit le résultat à `precision` chiffres significatifs
// - deux politiques : DemiHaut (calcul) et Bas (lecture tronquée)
//
// Pas d’état global : le Contexte est passé à chaque appel.

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use std::cmp::Ordering;
use std::fmt;

use super::erreur::ErreurPi;

/// Plafond de précision accepté (au-delà : dépassement, pas de repli silencieux).
pub const PRECISION_MAX: usize = 100_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arrondi {
    /// Arrondi au plus proche, milieu vers le haut (en valeur absolue).
    DemiHaut,
    /// Troncature vers zéro.
    Bas,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contexte {
    pub precision: usize,
    pub arrondi: Arrondi,
}

impl Contexte {
    pub fn new(precision: usize, arrondi: Arrondi) -> Result<Self, ErreurPi> {
        if precision == 0 {
            return Err(ErreurPi::EntreeInvalide("précision nulle".into()));
        }
        if precision > PRECISION_MAX {
            return Err(ErreurPi::DepassementArithmetique(format!(
                "précision {precision} > {PRECISION_MAX}"
            )));
        }
        Ok(Self { precision, arrondi })
    }

    pub fn demi_haut(precision: usize) -> Result<Self, ErreurPi> {
        Self::new(precision, Arrondi::DemiHaut)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decimal {
    mantisse: BigInt,
    exposant: i64,
}

/* ------------------------ Outils entiers ------------------------ */

pub(crate) fn puissance_dix(k: usize) -> Result<BigInt, ErreurPi> {
    let k = u32::try_from(k)
        .map_err(|_| ErreurPi::DepassementArithmetique(format!("10^{k} hors limites")))?;
    Ok(BigInt::from(10u32).pow(k))
}

/// Nombre de chiffres décimaux de |n| (0 compte pour 1).
fn nb_chiffres(n: &BigInt) -> usize {
    if n.is_zero() {
        return 1;
    }
    n.magnitude().to_str_radix(10).len()
}

fn decale_exposant(e: i64, k: usize) -> Result<i64, ErreurPi> {
    i64::try_from(k)
        .ok()
        .and_then(|k| e.checked_add(k))
        .ok_or_else(|| ErreurPi::DepassementArithmetique("exposant décimal".into()))
}

fn arrondir(mantisse: BigInt, exposant: i64, ctx: &Contexte) -> Result<Decimal, ErreurPi> {
    let n = nb_chiffres(&mantisse);
    if n <= ctx.precision {
        return Ok(Decimal::depuis_parties(mantisse, exposant));
    }

    let k = n - ctx.precision;
    let diviseur = puissance_dix(k)?;
    let negatif = mantisse.is_negative();
    let abs = mantisse.abs();

    let mut q = &abs / &diviseur;
    if ctx.arrondi == Arrondi::DemiHaut {
        let reste = &abs % &diviseur;
        if reste * 2u32 >= diviseur {
            q += 1u32;
        }
    }

    let mut exposant = decale_exposant(exposant, k)?;

    // 99…9 + 1 = 10…0 : un chiffre de trop, retrait exact
    if nb_chiffres(&q) > ctx.precision {
        q /= 10u32;
        exposant = decale_exposant(exposant, 1)?;
    }

    Ok(Decimal::depuis_parties(if negatif { -q } else { q }, exposant))
}

/* ------------------------ Décimal ------------------------ */

impl Decimal {
    pub fn zero() -> Self {
        Self {
            mantisse: BigInt::zero(),
            exposant: 0,
        }
    }

    pub fn entier(n: i64) -> Self {
        Self {
            mantisse: BigInt::from(n),
            exposant: 0,
        }
    }

    /// mantisse × 10^exposant, sans arrondi.
    pub fn depuis_parties(mantisse: BigInt, exposant: i64) -> Self {
        Self { mantisse, exposant }
    }

    pub fn est_zero(&self) -> bool {
        self.mantisse.is_zero()
    }

    pub fn est_negatif(&self) -> bool {
        self.mantisse.is_negative()
    }

    /// Exposant ajusté : position décimale du premier chiffre significatif.
    pub fn ordre(&self) -> i64 {
        self.exposant + nb_chiffres(&self.mantisse) as i64 - 1
    }

    pub fn oppose(&self) -> Self {
        Self {
            mantisse: -self.mantisse.clone(),
            exposant: self.exposant,
        }
    }

    pub fn arrondi(&self, ctx: &Contexte) -> Result<Self, ErreurPi> {
        arrondir(self.mantisse.clone(), self.exposant, ctx)
    }

    pub fn ajoute(&self, autre: &Decimal, ctx: &Contexte) -> Result<Self, ErreurPi> {
        if self.est_zero() {
            return autre.arrondi(ctx);
        }
        if autre.est_zero() {
            return self.arrondi(ctx);
        }

        // Terme négligeable : |petit| < 10^(ulp − 2), ulp = dernière place gardée
        // à `precision` chiffres ; le grand tient déjà dans la précision.
        // Le cran de plus couvre 10^k − petit, qui perd un chiffre d’ordre.
        if ctx.arrondi == Arrondi::DemiHaut {
            let (grand, petit) = if self.ordre() >= autre.ordre() {
                (self, autre)
            } else {
                (autre, self)
            };
            let ulp = grand.ordre() - ctx.precision as i64 + 1;
            if nb_chiffres(&grand.mantisse) <= ctx.precision && petit.ordre() < ulp - 2 {
                return grand.arrondi(ctx);
            }
        }

        let e = self.exposant.min(autre.exposant);
        let a = &self.mantisse * puissance_dix((self.exposant - e) as usize)?;
        let b = &autre.mantisse * puissance_dix((autre.exposant - e) as usize)?;
        arrondir(a + b, e, ctx)
    }

    pub fn soustrait(&self, autre: &Decimal, ctx: &Contexte) -> Result<Self, ErreurPi> {
        self.ajoute(&autre.oppose(), ctx)
    }

    pub fn multiplie(&self, autre: &Decimal, ctx: &Contexte) -> Result<Self, ErreurPi> {
        let e = self
            .exposant
            .checked_add(autre.exposant)
            .ok_or_else(|| ErreurPi::DepassementArithmetique("exposant décimal".into()))?;
        arrondir(&self.mantisse * &autre.mantisse, e, ctx)
    }

    pub fn divise(&self, autre: &Decimal, ctx: &Contexte) -> Result<Self, ErreurPi> {
        if autre.est_zero() {
            return Err(ErreurPi::DivisionParZero);
        }
        if self.est_zero() {
            return Ok(Decimal::zero());
        }

        // Quotient tronqué avec au moins precision+1 chiffres : l’arrondi
        // demi-haut sur la troncature coïncide avec celui du quotient exact.
        let manque = ctx.precision as i64 + 2 + nb_chiffres(&autre.mantisse) as i64
            - nb_chiffres(&self.mantisse) as i64;
        let s = manque.max(0) as usize;

        let num = self.mantisse.abs() * puissance_dix(s)?;
        let q = num / autre.mantisse.abs();
        let q = if self.est_negatif() != autre.est_negatif() {
            -q
        } else {
            q
        };

        let e = self
            .exposant
            .checked_sub(autre.exposant)
            .and_then(|e| e.checked_sub(s as i64))
            .ok_or_else(|| ErreurPi::DepassementArithmetique("exposant décimal".into()))?;
        arrondir(q, e, ctx)
    }

    /// Les `n` premiers chiffres après la virgule de |x| (troncature, complétés par des zéros).
    pub fn chiffres_fractionnaires(&self, n: usize) -> Result<String, ErreurPi> {
        if n == 0 {
            return Ok(String::new());
        }
        let abs = self.mantisse.abs();
        let decalage = self.exposant + n as i64;
        let tronque = match decalage.cmp(&0) {
            Ordering::Less => abs / puissance_dix((-decalage) as usize)?,
            Ordering::Equal => abs,
            Ordering::Greater => abs * puissance_dix(decalage as usize)?,
        };

        let txt = (tronque % puissance_dix(n)?).to_str_radix(10);
        let mut out = "0".repeat(n - txt.len());
        out.push_str(&txt);
        Ok(out)
    }

    /// Écriture décimale “plate” (jamais de notation scientifique).
    pub fn texte(&self) -> String {
        let signe = if self.est_negatif() { "-" } else { "" };
        let chiffres = self.mantisse.magnitude().to_str_radix(10);

        if self.exposant >= 0 {
            if self.mantisse.is_zero() {
                return "0".to_string();
            }
            return format!("{signe}{chiffres}{}", "0".repeat(self.exposant as usize));
        }

        let frac = (-self.exposant) as usize;
        if chiffres.len() > frac {
            let (ent, dec) = chiffres.split_at(chiffres.len() - frac);
            format!("{signe}{ent}.{dec}")
        } else {
            format!("{signe}0.{}{chiffres}", "0".repeat(frac - chiffres.len()))
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.texte())
    }
}

impl From<BigInt> for Decimal {
    fn from(n: BigInt) -> Self {
        Self {
            mantisse: n,
            exposant: 0,
        }
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Self::zero()
    }
}

/// 1/q, arrondi au contexte.
pub fn inverse(q: i64, ctx: &Contexte) -> Result<Decimal, ErreurPi> {
    Decimal::from(BigInt::one()).divise(&Decimal::entier(q), ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(p: usize) -> Contexte {
        Contexte::demi_haut(p).unwrap()
    }

    #[test]
    fn division_arrondie_demi_haut() {
        let un = Decimal::entier(1);
        assert_eq!(un.divise(&Decimal::entier(3), &ctx(5)).unwrap().texte(), "0.33333");
        let deux = Decimal::entier(2);
        assert_eq!(deux.divise(&Decimal::entier(3), &ctx(5)).unwrap().texte(), "0.66667");
        assert_eq!(
            Decimal::entier(-2).divise(&Decimal::entier(3), &ctx(3)).unwrap().texte(),
            "-0.667"
        );
    }

    #[test]
    fn milieu_arrondi_vers_le_haut() {
        let x = Decimal::depuis_parties(BigInt::from(125), -3); // 0.125
        assert_eq!(x.arrondi(&ctx(2)).unwrap().texte(), "0.13");

        let bas = Contexte::new(2, Arrondi::Bas).unwrap();
        assert_eq!(x.arrondi(&bas).unwrap().texte(), "0.12");
    }

    #[test]
    fn retenue_qui_ajoute_un_chiffre() {
        let x = Decimal::depuis_parties(BigInt::from(9996), -3); // 9.996
        let r = x.arrondi(&ctx(3)).unwrap();
        assert_eq!(r.texte(), "10.0");
    }

    #[test]
    fn division_par_zero() {
        let r = Decimal::entier(1).divise(&Decimal::zero(), &ctx(10));
        assert!(matches!(r, Err(ErreurPi::DivisionParZero)));
    }

    #[test]
    fn addition_alignee_et_arrondie() {
        let c = ctx(6);
        let a = Decimal::entier(3);
        let b = inverse(7, &c).unwrap(); // 0.142857
        assert_eq!(a.ajoute(&b, &c).unwrap().texte(), "3.14286");
        assert_eq!(a.soustrait(&b, &c).unwrap().texte(), "2.85714");
    }

    #[test]
    fn terme_negligeable_ignore() {
        let c = ctx(5);
        let a = Decimal::depuis_parties(BigInt::from(31416), -4);
        let petit = Decimal::depuis_parties(BigInt::from(7), -40);
        assert_eq!(a.ajoute(&petit, &c).unwrap(), a);
        assert_eq!(a.soustrait(&petit, &c).unwrap(), a);
    }

    #[test]
    fn terme_garde_si_mantisse_courte() {
        let c = ctx(10);
        let millieme = Decimal::depuis_parties(BigInt::from(1), -3);
        assert_eq!(Decimal::entier(3).ajoute(&millieme, &c).unwrap().texte(), "3.001");

        let a = Decimal::depuis_parties(BigInt::from(325), -2); // 3.25
        let b = Decimal::depuis_parties(BigInt::from(1), -4);
        assert_eq!(a.ajoute(&b, &c).unwrap().texte(), "3.2501");
        assert_eq!(a.soustrait(&b, &c).unwrap().texte(), "3.2499");
    }

    #[test]
    fn soustraction_sous_une_puissance_de_dix() {
        // 1.00 − 0.0006 = 0.9994 : un chiffre d’ordre en moins, le terme compte
        let c = ctx(3);
        let un = Decimal::entier(1);
        let b = Decimal::depuis_parties(BigInt::from(6), -4);
        assert_eq!(un.soustrait(&b, &c).unwrap().texte(), "0.999");
    }

    #[test]
    fn multiplication() {
        let c = ctx(4);
        let a = Decimal::depuis_parties(BigInt::from(12345), -4); // 1.2345
        let b = Decimal::entier(2);
        assert_eq!(a.multiplie(&b, &c).unwrap().texte(), "2.469");
    }

    #[test]
    fn chiffres_fractionnaires_tronques() {
        let x = Decimal::depuis_parties(BigInt::from(314159), -5);
        assert_eq!(x.chiffres_fractionnaires(3).unwrap(), "141");
        assert_eq!(x.chiffres_fractionnaires(7).unwrap(), "1415900");
        let petit = Decimal::depuis_parties(BigInt::from(5), -3);
        assert_eq!(petit.chiffres_fractionnaires(4).unwrap(), "0050");
    }

    #[test]
    fn precision_hors_limites() {
        assert!(matches!(
            Contexte::demi_haut(PRECISION_MAX + 1),
            Err(ErreurPi::DepassementArithmetique(_))
        ));
        assert!(matches!(
            Contexte::demi_haut(0),
            Err(ErreurPi::EntreeInvalide(_))
        ));
    }
}
