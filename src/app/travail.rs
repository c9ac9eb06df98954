//! src/app/travail.rs
//!
//! Calculs en arrière-plan (un seul à la fois).
//!
//! - Travail   : fil de calcul + jeton d’annulation ; l’UI sonde `termine()` à chaque frame
//! - Fermeture : partagée avec main.rs ; à l’arrêt de l’application, annule le calcul
//!   en cours et attend (borné) qu’il écrive lui-même sa transcription ; sinon
//!   l’écrit à sa place (écritures sérialisées et atomiques dans le Journal)

use std::path::Path;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::Reglages;
use crate::noyau::{
    calcul_journalise, extrait, Annulation, Bilan, ChiffreExtrait, Cible, DemandeExtraction,
    ErreurPi, Journal, Methode, Moteur, OracleEntier, Requete,
};

#[derive(Debug)]
pub enum Issue {
    Flux(Methode, Bilan),
    Extraction(ChiffreExtrait),
}

/// Attente bornée du calcul annulé, à la fermeture.
const DELAI_FERMETURE: Duration = Duration::from_secs(3);

/// Signal “le fil a fini” (transcription comprise), attendable avec délai.
#[derive(Clone, Debug, Default)]
struct Fin(Arc<(Mutex<bool>, Condvar)>);

impl Fin {
    fn signale(&self) {
        let (fini, cv) = &*self.0;
        *fini.lock().unwrap_or_else(|e| e.into_inner()) = true;
        cv.notify_all();
    }

    /// Vrai si la fin est arrivée dans le délai.
    fn attend(&self, delai: Duration) -> bool {
        let (fini, cv) = &*self.0;
        let garde = fini.lock().unwrap_or_else(|e| e.into_inner());
        let (garde, _) = cv
            .wait_timeout_while(garde, delai, |fini| !*fini)
            .unwrap_or_else(|e| e.into_inner());
        *garde
    }
}

pub struct Travail {
    annulation: Annulation,
    fin: Fin,
    poignee: JoinHandle<Result<Issue, ErreurPi>>,
}

impl Travail {
    pub fn flux(
        methode: Methode,
        cible: Cible,
        reglages: &Reglages,
        oracle: Arc<OracleEntier>,
        journal: Journal,
    ) -> Result<Self, ErreurPi> {
        let annulation = Annulation::new();
        let req = Requete::new(cible)
            .avec_annulation(annulation.clone())
            .avec_pause(reglages.pause)
            .avec_garde(reglages.garde);
        let precision_nilakantha = reglages.precision_nilakantha;
        let dossier = reglages.dossier.clone();
        let fin = Fin::default();
        let fin_fil = fin.clone();

        let poignee = thread::Builder::new()
            .name(format!("pi-{}", methode.nom()))
            .spawn(move || {
                let moteur = Moteur {
                    oracle: &*oracle,
                    precision_nilakantha,
                };
                let issue = calcul_journalise(methode, &req, &moteur, &journal, &dossier)
                    .map(|bilan| Issue::Flux(methode, bilan));
                fin_fil.signale();
                issue
            })?;

        Ok(Self {
            annulation,
            fin,
            poignee,
        })
    }

    pub fn extraction(
        demande: DemandeExtraction,
        oracle: Arc<OracleEntier>,
    ) -> Result<Self, ErreurPi> {
        let poignee = thread::Builder::new()
            .name("pi-extraction".into())
            .spawn(move || extrait(&demande, &*oracle).map(Issue::Extraction))?;

        Ok(Self {
            annulation: Annulation::new(),
            fin: Fin::default(),
            poignee,
        })
    }

    /// Demande d’arrêt : prise en compte à la prochaine fin d’itération.
    pub fn arreter(&self) {
        self.annulation.annule();
    }

    pub fn termine(&self) -> bool {
        self.poignee.is_finished()
    }

    /// Bloque jusqu’à la fin du fil (immédiat si `termine()`).
    pub fn recolter(self) -> Result<Issue, ErreurPi> {
        self.poignee
            .join()
            .map_err(|_| ErreurPi::Interne("le fil de calcul a paniqué".into()))?
    }
}

/* ------------------------ Arrêt de l’application ------------------------ */

#[derive(Clone, Debug, Default)]
pub struct Fermeture {
    journal: Journal,
    courant: Arc<Mutex<Option<(Methode, Annulation, Fin)>>>,
}

impl Fermeture {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            courant: Arc::default(),
        }
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn en_cours(&self, methode: Methode, travail: &Travail) {
        *self.courant.lock().unwrap_or_else(|e| e.into_inner()) =
            Some((methode, travail.annulation.clone(), travail.fin.clone()));
    }

    pub fn libere(&self) {
        self.courant.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    /// Annule le calcul en flux encore actif ; il écrit sa transcription en
    /// finissant. S’il ne finit pas dans le délai, on sauve ce qu’il a déjà émis.
    /// Sans calcul actif : rien à faire (la transcription a été écrite à la fin du calcul).
    pub fn fermer(&self, dossier: &Path) {
        self.fermer_dans(dossier, DELAI_FERMETURE);
    }

    fn fermer_dans(&self, dossier: &Path, delai: Duration) {
        let courant = self.courant.lock().unwrap_or_else(|e| e.into_inner()).take();
        let Some((methode, annulation, fin)) = courant else {
            return;
        };

        annulation.annule();
        if fin.attend(delai) {
            info!(methode = methode.nom(), "arrêt : transcription écrite par le calcul");
            return;
        }

        warn!(
            methode = methode.nom(),
            ?delai,
            "arrêt : calcul toujours actif, sauvegarde partielle"
        );
        if let Err(e) = self.journal.ecrire(dossier, methode.nom()) {
            error!(erreur = %e, "arrêt : transcription non écrite");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::StrategieDecimale;

    fn reglages_temp(nom: &str) -> Reglages {
        let dossier =
            std::env::temp_dir().join(format!("pi_chiffres_app_{nom}_{}", std::process::id()));
        std::fs::create_dir_all(&dossier).unwrap();
        Reglages {
            dossier,
            ..Reglages::default()
        }
    }

    #[test]
    fn flux_en_arriere_plan() {
        let reglages = reglages_temp("flux");
        let journal = Journal::new();
        let t = Travail::flux(
            Methode::Spigot,
            Cible::Chiffres(20),
            &reglages,
            Arc::new(OracleEntier::new(100)),
            journal.clone(),
        )
        .unwrap();

        match t.recolter().unwrap() {
            Issue::Flux(Methode::Spigot, bilan) => assert_eq!(bilan.chiffres, 20),
            autre => panic!("issue inattendue : {autre:?}"),
        }
        assert!(journal.instantane().starts_with("π = 3.14159265358979323846\n"));
        std::fs::remove_dir_all(&reglages.dossier).ok();
    }

    #[test]
    fn arret_du_mode_infini() {
        let reglages = reglages_temp("infini");
        let journal = Journal::new();
        let t = Travail::flux(
            Methode::Spigot,
            Cible::Infini,
            &reglages,
            Arc::new(OracleEntier::new(100)),
            journal.clone(),
        )
        .unwrap();

        t.arreter();
        match t.recolter().unwrap() {
            Issue::Flux(_, bilan) => assert!(bilan.annule),
            autre => panic!("issue inattendue : {autre:?}"),
        }
        assert!(journal.instantane().contains("interrompu"));
        std::fs::remove_dir_all(&reglages.dossier).ok();
    }

    #[test]
    fn extraction_en_arriere_plan() {
        let demande = DemandeExtraction::new(1, 16, None).unwrap();
        let t = Travail::extraction(demande, Arc::new(OracleEntier::new(10))).unwrap();
        match t.recolter().unwrap() {
            Issue::Extraction(c) => assert_eq!(c.caractere(), '2'),
            autre => panic!("issue inattendue : {autre:?}"),
        }

        let exacte = DemandeExtraction::new(1, 10, Some(StrategieDecimale::Exacte)).unwrap();
        let t = Travail::extraction(exacte, Arc::new(OracleEntier::new(10))).unwrap();
        assert!(matches!(t.recolter(), Ok(Issue::Extraction(c)) if c.caractere() == '1'));
    }

    #[test]
    fn fermeture_attend_la_transcription_du_calcul() {
        let reglages = reglages_temp("fermeture");
        let journal = Journal::new();
        let fermeture = Fermeture::new(journal.clone());
        let t = Travail::flux(
            Methode::Spigot,
            Cible::Infini,
            &reglages,
            Arc::new(OracleEntier::new(100)),
            journal,
        )
        .unwrap();
        fermeture.en_cours(Methode::Spigot, &t);

        fermeture.fermer(&reglages.dossier);

        // le calcul a écrit avant le retour : fichier complet, pied compris
        let ecrit = std::fs::read_to_string(reglages.dossier.join("spigot.txt")).unwrap();
        assert!(ecrit.starts_with("π = 3.1"));
        assert!(ecrit.ends_with("interrompu]\n"), "{ecrit:?}");
        assert!(matches!(t.recolter(), Ok(Issue::Flux(_, b)) if b.annule));
        std::fs::remove_dir_all(&reglages.dossier).ok();
    }

    #[test]
    fn fermeture_sauve_un_calcul_qui_ne_finit_pas() {
        let reglages = reglages_temp("fermeture_lente");
        let mut journal = Journal::new();
        let fermeture = Fermeture::new(journal.clone());
        let annulation = Annulation::new();

        crate::noyau::flux::PuitsChiffres::ajoute(&mut journal, "π = 3.14");
        // fil fictif : la fin n’est jamais signalée
        *fermeture.courant.lock().unwrap() =
            Some((Methode::Machin, annulation.clone(), Fin::default()));
        fermeture.fermer_dans(&reglages.dossier, Duration::from_millis(20));

        assert!(annulation.est_annule());
        let ecrit = std::fs::read_to_string(reglages.dossier.join("machin.txt")).unwrap();
        assert_eq!(ecrit, "π = 3.14");
        std::fs::remove_dir_all(&reglages.dossier).ok();
    }
}
