// src/noyau/methode.rs
//
// Choix d’une méthode + exécution journalisée.
// - Methode : variante choisie une fois par calcul
// - Moteur  : collaborateurs explicites (oracle, précision Nilakantha)
// - calcul_journalise : en-tête, calcul, pied, écriture fichier
//   (même en cas d’erreur : on tente de sauver ce qui a déjà été émis)

use std::path::Path;
use tracing::error;

use super::erreur::ErreurPi;
use super::flux::{Bilan, Cible, Journal, PuitsChiffres, Requete};
use super::machin::machin;
use super::nilakantha::nilakantha;
use super::oracle::{flux_oracle, OraclePi};
use super::spigot::spigot;

/// Chiffres demandés à l’oracle quand la cible est infinie.
pub const CHIFFRES_ORACLE_DEFAUT: usize = 5000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Methode {
    Machin,
    Nilakantha,
    Spigot,
    Oracle,
}

impl Methode {
    pub const TOUTES: [Methode; 4] = [
        Methode::Machin,
        Methode::Nilakantha,
        Methode::Spigot,
        Methode::Oracle,
    ];

    /// Nom court (fichier de transcription).
    pub fn nom(&self) -> &'static str {
        match self {
            Methode::Machin => "machin",
            Methode::Nilakantha => "nilakantha",
            Methode::Spigot => "spigot",
            Methode::Oracle => "oracle",
        }
    }

    pub fn libelle(&self) -> &'static str {
        match self {
            Methode::Machin => "Formule de Machin",
            Methode::Nilakantha => "Série de Nilakantha",
            Methode::Spigot => "Spigot (Rabinowitz–Wagon)",
            Methode::Oracle => "Oracle haute précision",
        }
    }

    /// Seules les méthodes en flux acceptent le mode infini.
    pub fn accepte_infini(&self) -> bool {
        !matches!(self, Methode::Oracle)
    }
}

pub struct Moteur<'a> {
    pub oracle: &'a dyn OraclePi,
    pub precision_nilakantha: usize,
}

pub fn lance(
    methode: Methode,
    req: &Requete,
    moteur: &Moteur<'_>,
    puits: &mut impl PuitsChiffres,
) -> Result<Bilan, ErreurPi> {
    match methode {
        Methode::Machin => machin(req, puits),
        Methode::Nilakantha => nilakantha(req, moteur.precision_nilakantha, puits),
        Methode::Spigot => spigot(req, puits),
        Methode::Oracle => {
            let chiffres = match req.cible {
                Cible::Chiffres(n) => usize::try_from(n).map_err(|_| {
                    ErreurPi::DepassementArithmetique(format!("{n} chiffres"))
                })?,
                Cible::Infini => CHIFFRES_ORACLE_DEFAUT,
            };
            flux_oracle(moteur.oracle, chiffres, req, puits)
        }
    }
}

/// Exécute une méthode dans le journal puis écrit `<dossier>/<méthode>.txt`.
/// Une erreur de calcul n’empêche pas l’écriture de ce qui a déjà été émis.
pub fn calcul_journalise(
    methode: Methode,
    req: &Requete,
    moteur: &Moteur<'_>,
    journal: &Journal,
    dossier: &Path,
) -> Result<Bilan, ErreurPi> {
    journal.vide();
    let mut puits = journal.clone();
    puits.ajoute("π = ");

    let resultat = lance(methode, req, moteur, &mut puits);

    match &resultat {
        Ok(bilan) if bilan.annule => {
            puits.ajoute(&format!("\n[{} : interrompu]\n", methode.libelle()))
        }
        Ok(_) => puits.ajoute(&format!("\n[{} : fin du calcul]\n", methode.libelle())),
        Err(e) => {
            error!(methode = methode.nom(), erreur = %e, "calcul abandonné");
            puits.ajoute(&format!("\n[{} : erreur : {e}]\n", methode.libelle()));
        }
    }

    match (journal.ecrire(dossier, methode.nom()), resultat) {
        (Ok(_), r) => r,
        // l’erreur de calcul prime sur celle d’écriture
        (Err(io), Err(e)) => {
            error!(erreur = %io, "transcription non écrite");
            Err(e)
        }
        (Err(io), Ok(_)) => Err(io),
    }
}
