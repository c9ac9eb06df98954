// src/noyau/bbp.rs
//
// Extraction d’un chiffre isolé de π (Bailey–Borwein–Plouffe).
//
// Hex (exact à la précision f64 près) :
//   chiffre(pos) = floor(16 · frac(4·S(1,n) − 2·S(4,n) − S(5,n) − S(6,n))), n = pos − 1
//   S(j,n) = Σ_{k≤n} (16^(n−k) mod (8k+j))/(8k+j) + Σ_{k>n} 16^(n−k)/(8k+j)
//
// Décimal : deux stratégies, choisies une fois par demande.
// - Exacte    : l’oracle calcule tous les chiffres jusqu’à pos, on en lit un
// - Approchee : bloc hex → entier → ×10^pos / 16^… ; APPROXIMATIF (retenues
//               au bord du bloc non résolues), toujours signalé comme tel

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::decimal::puissance_dix;
use super::erreur::ErreurPi;
use super::oracle::OraclePi;

/// Seuil sous lequel un terme de queue est ignoré.
const TOLERANCE: f64 = 1e-17;

/// Termes de queue au plus (garde-fou).
const TERMES_QUEUE_MAX: u64 = 1000;

/// Recul (en chiffres hex) avant la position estimée, pour absorber les retenues.
pub const MARGE_HEX: u64 = 6;

/// Longueur du bloc hex converti en décimal.
pub const BLOC_HEX: u64 = 50;

pub const AVERTISSEMENT_APPROCHE: &str =
    "approximatif : des retenues au bord du bloc hex peuvent fausser ce chiffre";

/* ------------------------ Exponentiation modulaire ------------------------ */

/// 16^exp mod m, par carrés successifs.
pub fn mod_pow16(exp: u64, m: u64) -> u64 {
    if m <= 1 {
        return 0;
    }

    if m <= u32::MAX as u64 {
        // base, resultat < m < 2^32 : les produits tiennent dans u64
        let mut resultat = 1 % m;
        let mut base = 16 % m;
        let mut e = exp;
        while e > 0 {
            if e & 1 == 1 {
                resultat = resultat * base % m;
            }
            base = base * base % m;
            e >>= 1;
        }
        return resultat;
    }

    let r = BigUint::from(16u32).modpow(&BigUint::from(exp), &BigUint::from(m));
    // r < m ≤ u64::MAX
    r.to_u64().unwrap_or(0)
}

/* ------------------------ Séries ------------------------ */

fn frac(x: f64) -> f64 {
    x - x.floor()
}

fn serie(j: u64, n: u64) -> Result<f64, ErreurPi> {
    let mut s = 0.0f64;

    for k in 0..=n {
        let denom = k
            .checked_mul(8)
            .and_then(|v| v.checked_add(j))
            .ok_or_else(|| ErreurPi::DepassementArithmetique(format!("module 8·{k}+{j}")))?;
        let t = mod_pow16(n - k, denom);
        s = frac(s + t as f64 / denom as f64);
    }

    // queue : 16^(n−k) avec k > n, donc exposants négatifs bornés par TERMES_QUEUE_MAX
    for ecart in 1..=TERMES_QUEUE_MAX {
        let k = n as f64 + ecart as f64;
        let terme = 16f64.powi(-(ecart as i32)) / (8.0 * k + j as f64);
        if terme < TOLERANCE {
            break;
        }
        s = frac(s + terme);
    }

    Ok(frac(s))
}

/// Chiffre hexadécimal de π en position `position` (1 = premier après la virgule).
pub fn hex_chiffre(position: u64) -> Result<u8, ErreurPi> {
    if position == 0 {
        return Err(ErreurPi::EntreeInvalide("position 0 (la première est 1)".into()));
    }
    let n = position - 1;

    let x = 4.0 * serie(1, n)? - 2.0 * serie(4, n)? - serie(5, n)? - serie(6, n)?;
    let chiffre = (16.0 * frac(x)) as i64;
    Ok(chiffre.clamp(0, 15) as u8)
}

/* ------------------------ Demande d’extraction ------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategieDecimale {
    Exacte,
    Approchee,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Base {
    Hex,
    Dec(StrategieDecimale),
}

impl Base {
    pub fn radix(&self) -> u32 {
        match self {
            Base::Hex => 16,
            Base::Dec(_) => 10,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DemandeExtraction {
    pub position: u64,
    pub base: Base,
}

impl DemandeExtraction {
    /// Valide une demande venant de l’interface (position ≥ 1, base 16 ou 10,
    /// stratégie obligatoire en base 10).
    pub fn new(
        position: i64,
        base: u32,
        strategie: Option<StrategieDecimale>,
    ) -> Result<Self, ErreurPi> {
        if position <= 0 {
            return Err(ErreurPi::EntreeInvalide(format!(
                "position {position} (doit être positive)"
            )));
        }
        let base = match (base, strategie) {
            (16, _) => Base::Hex,
            (10, Some(s)) => Base::Dec(s),
            (10, None) => {
                return Err(ErreurPi::EntreeInvalide(
                    "base 10 : choisir la stratégie exacte ou approchée".into(),
                ))
            }
            (b, _) => {
                return Err(ErreurPi::EntreeInvalide(format!(
                    "base {b} (16 ou 10 seulement)"
                )))
            }
        };
        Ok(Self {
            position: position as u64,
            base,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChiffreExtrait {
    pub position: u64,
    pub base: Base,
    pub valeur: u8,
    pub duree: Duration,
}

impl ChiffreExtrait {
    pub fn caractere(&self) -> char {
        char::from_digit(self.valeur as u32, self.base.radix())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }

    pub fn approximatif(&self) -> bool {
        self.base == Base::Dec(StrategieDecimale::Approchee)
    }

    pub fn avertissement(&self) -> Option<&'static str> {
        self.approximatif().then_some(AVERTISSEMENT_APPROCHE)
    }
}

impl fmt::Display for ChiffreExtrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let genre = match self.base {
            Base::Hex => "hex",
            Base::Dec(_) => "décimal",
        };
        write!(
            f,
            "chiffre {genre} de π en position {} = {} (temps : {:.2}s)",
            self.position,
            self.caractere(),
            self.duree.as_secs_f64()
        )?;
        if let Some(a) = self.avertissement() {
            write!(f, " ; {a}")?;
        }
        Ok(())
    }
}

/* ------------------------ Décimal ------------------------ */

fn decimal_exact(position: u64, oracle: &dyn OraclePi) -> Result<u8, ErreurPi> {
    let chiffres = position
        .checked_add(5)
        .and_then(|c| usize::try_from(c).ok())
        .ok_or_else(|| ErreurPi::DepassementArithmetique(format!("position {position}")))?;

    let texte = oracle.calcule_pi(chiffres)?;
    let virgule = texte.find('.').map(|i| i + 1).unwrap_or(texte.len());

    texte
        .as_bytes()
        .get(virgule + (position - 1) as usize)
        .and_then(|b| (*b as char).to_digit(10))
        .map(|d| d as u8)
        .ok_or_else(|| {
            ErreurPi::OracleIndisponible("l’oracle a rendu moins de chiffres que prévu".into())
        })
}

/// Première position hex du bloc : pos·log(10)/log(16), moins la marge.
fn debut_bloc_hex(position: u64) -> u64 {
    let ratio = 10f64.ln() / 16f64.ln();
    let estime = (position.saturating_sub(1) as f64 * ratio).floor() as u64;
    estime.saturating_sub(MARGE_HEX).max(1)
}

fn decimal_approche(position: u64) -> Result<u8, ErreurPi> {
    let debut = debut_bloc_hex(position);
    debug!(debut, longueur = BLOC_HEX, "bloc hex → décimal");

    let mut bloc = BigInt::zero();
    for h in debut..debut + BLOC_HEX {
        bloc = bloc * 16u32 + hex_chiffre(h)?;
    }

    let exposant = u32::try_from(BLOC_HEX + debut - 1)
        .map_err(|_| ErreurPi::DepassementArithmetique("16^… hors limites".into()))?;
    let position_usize = usize::try_from(position)
        .map_err(|_| ErreurPi::DepassementArithmetique(format!("position {position}")))?;

    // fragment de π porté par le bloc, décalé de `position` chiffres décimaux
    let fragment = BigRational::new(bloc, BigInt::from(16u32).pow(exposant));
    let decale = fragment * BigRational::from_integer(puissance_dix(position_usize)?);
    let entier = decale.floor().to_integer();

    Ok((entier % 10u32).to_u8().unwrap_or(0))
}

/// Traite une demande d’extraction (une stratégie, résolue une fois).
pub fn extrait(
    demande: &DemandeExtraction,
    oracle: &dyn OraclePi,
) -> Result<ChiffreExtrait, ErreurPi> {
    let t0 = Instant::now();

    let valeur = match demande.base {
        Base::Hex => hex_chiffre(demande.position)?,
        Base::Dec(StrategieDecimale::Exacte) => decimal_exact(demande.position, oracle)?,
        Base::Dec(StrategieDecimale::Approchee) => decimal_approche(demande.position)?,
    };

    let extrait = ChiffreExtrait {
        position: demande.position,
        base: demande.base,
        valeur,
        duree: t0.elapsed(),
    };
    info!(%extrait, "extraction");
    Ok(extrait)
}
