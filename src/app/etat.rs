//! src/app/etat.rs
//!
//! État UI (sans dessin).
//!
//! Rôle : contenir les saisies (méthode, chiffres, position, base), les messages
//! et le calcul en cours ; valider les saisies avant de lancer un `Travail`.
//!
//! Contrats :
//! - Une saisie invalide est signalée, jamais fatale à l’application.
//! - Un seul calcul à la fois ; la vue sonde sa fin à chaque frame.

use std::sync::Arc;

use tracing::{info, warn};

use super::travail::{Fermeture, Issue, Travail};
use crate::config::Reglages;
use crate::noyau::{
    ChiffreExtrait, Cible, DemandeExtraction, ErreurPi, Journal, Methode, OracleEntier,
    StrategieDecimale,
};

/// Saisie initiale du nombre de chiffres.
const CHIFFRES_DEFAUT: &str = "100";

/// Garde-fou : au-delà, une cible finie est refusée (anti-gel).
const CHIFFRES_MAX: u64 = 1_000_000;

/// Saisie initiale de la position (extraction).
const POSITION_DEFAUT: &str = "1";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Flux(Methode),
    Extraction,
}

pub struct AppPi {
    // --- saisies ---
    pub mode: Mode,
    pub infini: bool,
    pub saisie_chiffres: String,
    pub saisie_position: String,
    pub base: u32, // 16 ou 10
    pub strategie: StrategieDecimale,

    // --- sorties ---
    pub statut: String,
    pub erreur: String,
    pub extraction: Option<ChiffreExtrait>,
    pub journal: Journal,

    // --- calcul ---
    reglages: Reglages,
    oracle: Arc<OracleEntier>,
    fermeture: Fermeture,
    travail: Option<Travail>,
}

impl AppPi {
    pub fn new(reglages: Reglages, fermeture: Fermeture) -> Self {
        Self {
            mode: Mode::Flux(Methode::Spigot),
            infini: false,
            saisie_chiffres: CHIFFRES_DEFAUT.to_string(),
            saisie_position: POSITION_DEFAUT.to_string(),
            base: 16,
            strategie: StrategieDecimale::Exacte,
            statut: String::new(),
            erreur: String::new(),
            extraction: None,
            journal: fermeture.journal().clone(),
            oracle: Arc::new(OracleEntier::new(reglages.limite_oracle)),
            reglages,
            fermeture,
            travail: None,
        }
    }

    pub fn occupe(&self) -> bool {
        self.travail.is_some()
    }

    /* ------------------------ Actions ------------------------ */

    /// "Démarrer" : lance la méthode ou l’extraction choisie.
    pub fn demarrer(&mut self) {
        if self.occupe() {
            return;
        }
        self.effacer_messages();
        match self.mode {
            Mode::Flux(methode) => self.lancer_flux(methode),
            Mode::Extraction => self.extraire(),
        }
    }

    /// "Arrêter" : prise en compte par le calcul à sa prochaine itération.
    pub fn arreter(&mut self) {
        if let Some(t) = &self.travail {
            t.arreter();
            self.statut = "arrêt demandé…".into();
        }
    }

    pub fn effacer_messages(&mut self) {
        self.statut.clear();
        self.erreur.clear();
        self.extraction = None;
    }

    fn lancer_flux(&mut self, methode: Methode) {
        let cible = if self.infini && methode.accepte_infini() {
            Ok(Cible::Infini)
        } else {
            Cible::depuis_saisie(&self.saisie_chiffres).and_then(|c| match c {
                Cible::Chiffres(n) if n > CHIFFRES_MAX => Err(ErreurPi::EntreeInvalide(format!(
                    "{n} chiffres (maximum {CHIFFRES_MAX})"
                ))),
                c => Ok(c),
            })
        };

        let lance = cible.and_then(|cible| {
            Travail::flux(
                methode,
                cible,
                &self.reglages,
                Arc::clone(&self.oracle),
                self.journal.clone(),
            )
        });

        match lance {
            Ok(t) => {
                info!(methode = methode.nom(), "calcul lancé");
                self.fermeture.en_cours(methode, &t);
                self.statut = format!("{} : calcul en cours…", methode.libelle());
                self.travail = Some(t);
            }
            Err(e) => self.signaler(e),
        }
    }

    fn extraire(&mut self) {
        let demande = self
            .saisie_position
            .trim()
            .parse::<i64>()
            .map_err(|_| ErreurPi::EntreeInvalide(format!("position {:?}", self.saisie_position)))
            .and_then(|p| DemandeExtraction::new(p, self.base, Some(self.strategie)));

        match demande.and_then(|d| Travail::extraction(d, Arc::clone(&self.oracle))) {
            Ok(t) => {
                self.statut = "extraction en cours…".into();
                self.travail = Some(t);
            }
            Err(e) => self.signaler(e),
        }
    }

    /* ------------------------ Fin de calcul ------------------------ */

    /// Récolte le calcul s’il est terminé (non bloquant sinon).
    pub fn sonder(&mut self) {
        if !self.travail.as_ref().is_some_and(Travail::termine) {
            return;
        }
        let Some(travail) = self.travail.take() else {
            return;
        };
        self.fermeture.libere();

        match travail.recolter() {
            Ok(Issue::Flux(methode, bilan)) => {
                self.statut = if bilan.annule {
                    format!("{} : interrompu après {} chiffres", methode.libelle(), bilan.chiffres)
                } else {
                    format!("{} : {} chiffres", methode.libelle(), bilan.chiffres)
                };
            }
            Ok(Issue::Extraction(chiffre)) => {
                self.statut.clear();
                self.extraction = Some(chiffre);
            }
            Err(e) => {
                self.statut.clear();
                self.signaler(e);
            }
        }
    }

    fn signaler(&mut self, e: ErreurPi) {
        warn!(erreur = %e, "requête en échec");
        self.erreur = if e.est_fatale_au_calcul() {
            format!("calcul abandonné : {e}")
        } else {
            format!("requête refusée : {e}")
        };
    }
}
