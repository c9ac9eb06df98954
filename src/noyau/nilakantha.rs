// src/noyau/nilakantha.rs
//
// π par la série de Nilakantha :
//   π = 3 + 4/(2·3·4) − 4/(4·5·6) + 4/(6·7·8) − …
//
// Précision FIXÉE au départ (pas de recalcul) : c’est une approximation assumée.
// Au-delà d’un grand nombre d’itérations, les derniers chiffres peuvent être faux
// sans que rien ne le signale.
//
// Règle d’émission : la série alterne, donc π est encadré par deux sommes
// partielles consécutives. Un chiffre est émis quand les deux lectures tronquées
// s’accordent sur lui ; au plus un chiffre par itération.

use num_bigint::BigInt;
use tracing::{debug, info, warn};

use super::decimal::{Contexte, Decimal};
use super::erreur::ErreurPi;
use super::flux::{Bilan, Cible, PuitsChiffres, Requete};

/// Précision de travail : fixée une fois pour toute la série.
pub fn precision_de_travail(cible: Cible, garde: usize, precision_infinie: usize) -> usize {
    match cible {
        Cible::Chiffres(n) => (n as usize).saturating_add(1 + garde),
        Cible::Infini => precision_infinie.max(1 + garde + 1),
    }
}

/// 4 / (n·(n+1)·(n+2))
fn terme(n: u64, ctx: &Contexte) -> Result<Decimal, ErreurPi> {
    let n = BigInt::from(n);
    let d = &n * (&n + 1u32) * (&n + 2u32);
    Decimal::entier(4).divise(&Decimal::from(d), ctx)
}

pub fn nilakantha(
    req: &Requete,
    precision_infinie: usize,
    puits: &mut impl PuitsChiffres,
) -> Result<Bilan, ErreurPi> {
    let precision = precision_de_travail(req.cible, req.garde, precision_infinie);
    let ctx = Contexte::demi_haut(precision)?;
    // chiffres lisibles sans toucher à la garde (le “3” compte pour un)
    let lisibles = (precision - 1 - req.garde) as u64;

    info!(cible = ?req.cible, precision, "Nilakantha : début");
    puits.ajoute("3.");

    let mut somme = Decimal::entier(3);
    let mut n: u64 = 2;
    let mut positif = true;
    let mut emis: u64 = 0;
    let mut annule = false;
    let mut sature = false;

    while !req.cible.atteinte(emis) {
        let t = terme(n, &ctx)?;
        let precedente = somme.clone();
        somme = if positif {
            somme.ajoute(&t, &ctx)?
        } else {
            somme.soustrait(&t, &ctx)?
        };
        positif = !positif;
        n = n
            .checked_add(2)
            .ok_or_else(|| ErreurPi::DepassementArithmetique("indice Nilakantha".into()))?;

        if emis < lisibles {
            let k = emis as usize + 1;
            let avant = precedente.chiffres_fractionnaires(k)?;
            let apres = somme.chiffres_fractionnaires(k)?;
            if avant == apres {
                puits.ajoute(&apres[k - 1..]);
                emis += 1;
            }
        } else if !sature {
            // le terme passe sous la résolution : plus rien ne sortira
            warn!(precision, emis, "Nilakantha : précision saturée, aucun nouveau chiffre");
            sature = true;
        }

        if req.cible.atteinte(emis) {
            break;
        }
        if req.interrompue() {
            annule = true;
            break;
        }
    }

    debug!(somme = %somme, "Nilakantha : dernière somme partielle");
    info!(chiffres = emis, iterations = (n - 2) / 2, annule, "Nilakantha : fin");
    Ok(Bilan {
        chiffres: emis,
        annule,
    })
}
