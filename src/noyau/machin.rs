// src/noyau/machin.rs
//
// π par la formule de Machin : π = 4·(4·atan(1/5) − atan(1/239))
//
// Protocole “recalcul puis différence” :
// - état explicite { emis (frontière), precision }
// - à chaque tour : précision ≈ frontière + pas + garde, π recalculé entièrement,
//   lecture tronquée, on n’émet que le suffixe au-delà de la frontière
// - la précision ne décroît jamais ; ce qui est émis n’est jamais repris

use tracing::{debug, info, warn};

use super::decimal::{inverse, Arrondi, Contexte, Decimal};
use super::erreur::ErreurPi;
use super::flux::{Bilan, PuitsChiffres, Requete};

/// Précision de travail minimale.
const PRECISION_MIN: usize = 20;

/// Chiffres visés au minimum par tour (le pas grandit ensuite avec la frontière).
const PAS_MIN: u64 = 10;

/// atan(x) = Σ (−1)^i · x^(2i+1)/(2i+1), au plus `precision` termes.
/// On s’arrête plus tôt dès qu’un terme passe sous la résolution du contexte.
pub fn arctan(x: &Decimal, ctx: &Contexte) -> Result<Decimal, ErreurPi> {
    let x2 = x.multiplie(x, ctx)?;
    let plancher = x.ordre() - ctx.precision as i64 - 2;

    let mut somme = Decimal::zero();
    let mut puissance = x.clone();

    for i in 0..ctx.precision {
        let terme = puissance.divise(&Decimal::entier(2 * i as i64 + 1), ctx)?;
        if terme.est_zero() || terme.ordre() < plancher {
            break;
        }

        somme = if i % 2 == 0 {
            somme.ajoute(&terme, ctx)?
        } else {
            somme.soustrait(&terme, ctx)?
        };

        puissance = puissance.multiplie(&x2, ctx)?;
    }

    Ok(somme)
}

/// π au contexte donné (chaque étape arrondie à `ctx.precision` chiffres).
pub fn pi_machin(ctx: &Contexte) -> Result<Decimal, ErreurPi> {
    let quatre = Decimal::entier(4);
    let a = arctan(&inverse(5, ctx)?, ctx)?;
    let b = arctan(&inverse(239, ctx)?, ctx)?;
    a.multiplie(&quatre, ctx)?
        .soustrait(&b, ctx)?
        .multiplie(&quatre, ctx)
}

/// État de la boucle de raffinement.
#[derive(Clone, Debug, Default)]
pub struct Frontiere {
    /// Chiffres déjà émis (et considérés stables).
    pub emis: u64,
    /// Précision du dernier tour.
    pub precision: usize,
    /// Chiffres émis, gardés pour vérifier qu’un tour plus précis ne les contredit pas.
    confirmes: String,
}

impl Frontiere {
    /// Un tour : recalcul complet à précision accrue, renvoie les chiffres nouveaux
    /// (au plus `restant` si une cible est fixée).
    pub fn tour(&mut self, garde: usize, restant: Option<u64>) -> Result<String, ErreurPi> {
        let mut pas = PAS_MIN.max(self.emis / 2);
        if let Some(r) = restant {
            pas = pas.min(r);
        }
        let vise = self
            .emis
            .checked_add(pas)
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| ErreurPi::DepassementArithmetique("frontière Machin".into()))?;

        // +1 : le “3” avant la virgule consomme un chiffre significatif
        let precision = vise
            .checked_add(1 + garde)
            .ok_or_else(|| ErreurPi::DepassementArithmetique("précision Machin".into()))?
            .max(PRECISION_MIN)
            .max(self.precision);
        let ctx = Contexte::demi_haut(precision)?;

        let pi = pi_machin(&ctx)?;
        // lecture tronquée : "3" + `vise` décimales
        let lecture = pi
            .arrondi(&Contexte::new(vise + 1, Arrondi::Bas)?)?
            .chiffres_fractionnaires(vise)?;

        let deja = self.confirmes.len();
        if lecture[..deja] != self.confirmes {
            // Ne devrait pas arriver avec la garde : on le signale, on ne retire rien.
            warn!(precision, "Machin : un tour plus précis contredit des chiffres émis");
        }

        let nouveaux = lecture[deja..].to_string();
        self.confirmes.push_str(&nouveaux);
        self.emis = vise as u64;
        self.precision = precision;

        debug!(precision, emis = self.emis, "Machin : tour");
        Ok(nouveaux)
    }
}

/// Générateur Machin : pousse “3.” puis les chiffres confirmés, tour après tour.
pub fn machin(req: &Requete, puits: &mut impl PuitsChiffres) -> Result<Bilan, ErreurPi> {
    info!(cible = ?req.cible, "Machin : début");
    puits.ajoute("3.");

    let mut frontiere = Frontiere::default();
    let mut annule = false;

    while !req.cible.atteinte(frontiere.emis) {
        let nouveaux = frontiere.tour(req.garde, req.cible.restant(frontiere.emis))?;
        puits.ajoute(&nouveaux);

        if req.cible.atteinte(frontiere.emis) {
            break;
        }
        if req.interrompue() {
            annule = true;
            break;
        }
    }

    info!(chiffres = frontiere.emis, annule, "Machin : fin");
    Ok(Bilan {
        chiffres: frontiere.emis,
        annule,
    })
}
