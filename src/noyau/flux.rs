// src/noyau/flux.rs
//
// Flux de chiffres : ce que les générateurs produisent et à qui ils le poussent.
// - PuitsChiffres : “ajouter du texte, dans l’ordre” (rien d’autre)
// - Journal       : puits partagé (Mutex) + transcription + écriture fichier
// - Annulation    : jeton coopératif, consulté entre deux itérations seulement
// - Requete       : cible + annulation + réglages d’un calcul (pas d’état global)

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::info;

use super::erreur::ErreurPi;

/// Garde minimale (chiffres internes en plus de ceux qu’on affiche).
pub const GARDE_MIN: usize = 10;

/// Largeur de ligne de la transcription.
pub const LARGEUR_LIGNE: usize = 80;

/* ------------------------ Puits ------------------------ */

pub trait PuitsChiffres {
    fn ajoute(&mut self, texte: &str);
}

impl PuitsChiffres for String {
    fn ajoute(&mut self, texte: &str) {
        self.push_str(texte);
    }
}

impl<P: PuitsChiffres + ?Sized> PuitsChiffres for &mut P {
    fn ajoute(&mut self, texte: &str) {
        (**self).ajoute(texte);
    }
}

/// Tampon partagé entre le calcul (ajouts) et l’UI / l’arrêt (lectures).
/// Ajout et lecture passent par le même verrou : une lecture ne voit jamais
/// un morceau à moitié ajouté.
/// Les écritures fichier (calcul, arrêt) sont sérialisées par un second verrou.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    tampon: Arc<Mutex<String>>,
    ecriture: Arc<Mutex<()>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    fn verrou(&self) -> MutexGuard<'_, String> {
        // Un calcul qui panique ne doit pas rendre le journal illisible.
        self.tampon.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn vide(&self) {
        self.verrou().clear();
    }

    /// Copie cohérente du contenu brut.
    pub fn instantane(&self) -> String {
        self.verrou().clone()
    }

    /// Contenu coupé à `largeur` colonnes (les '\n' existants remettent la colonne à 0).
    pub fn texte_enveloppe(&self, largeur: usize) -> String {
        envelopper(&self.instantane(), largeur)
    }

    /// Écrit la transcription dans `<dossier>/<methode>.txt`.
    /// Fichier provisoire puis renommage : le fichier final est toujours complet,
    /// même si le processus s’arrête pendant l’écriture.
    pub fn ecrire(&self, dossier: &Path, methode: &str) -> Result<PathBuf, ErreurPi> {
        let chemin = dossier.join(format!("{methode}.txt"));
        let provisoire = dossier.join(format!(".{methode}.txt.part"));

        let _ecriture = self.ecriture.lock().unwrap_or_else(|e| e.into_inner());
        fs::write(&provisoire, self.texte_enveloppe(LARGEUR_LIGNE))?;
        fs::rename(&provisoire, &chemin)?;
        info!(chemin = %chemin.display(), "transcription écrite");
        Ok(chemin)
    }
}

impl PuitsChiffres for Journal {
    fn ajoute(&mut self, texte: &str) {
        self.verrou().push_str(texte);
    }
}

pub fn envelopper(texte: &str, largeur: usize) -> String {
    if largeur == 0 {
        return texte.to_string();
    }
    let mut out = String::with_capacity(texte.len() + texte.len() / largeur + 1);
    let mut col = 0usize;
    for c in texte.chars() {
        out.push(c);
        if c == '\n' {
            col = 0;
        } else {
            col += 1;
            if col >= largeur {
                out.push('\n');
                col = 0;
            }
        }
    }
    out
}

/* ------------------------ Annulation ------------------------ */

#[derive(Clone, Debug, Default)]
pub struct Annulation(Arc<AtomicBool>);

impl Annulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn annule(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn est_annule(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/* ------------------------ Requête de calcul ------------------------ */

/// Nombre de chiffres après la virgule demandés.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cible {
    Chiffres(u64),
    Infini,
}

impl Cible {
    /// Saisie utilisateur : un entier > 0, sinon mode infini (comportement du menu).
    pub fn depuis_saisie(saisie: &str) -> Result<Self, ErreurPi> {
        let n: i64 = saisie
            .trim()
            .parse()
            .map_err(|_| ErreurPi::EntreeInvalide(format!("nombre de chiffres {saisie:?}")))?;
        if n <= 0 {
            return Err(ErreurPi::EntreeInvalide(format!(
                "nombre de chiffres {n} (doit être > 0)"
            )));
        }
        Ok(Cible::Chiffres(n as u64))
    }

    pub fn atteinte(&self, emis: u64) -> bool {
        matches!(self, Cible::Chiffres(n) if emis >= *n)
    }

    /// Chiffres encore autorisés (None = illimité).
    pub fn restant(&self, emis: u64) -> Option<u64> {
        match self {
            Cible::Chiffres(n) => Some(n.saturating_sub(emis)),
            Cible::Infini => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Requete {
    pub cible: Cible,
    pub annulation: Annulation,
    /// Pause entre deux itérations (rythme d’affichage).
    pub pause: Duration,
    pub garde: usize,
}

impl Requete {
    pub fn new(cible: Cible) -> Self {
        Self {
            cible,
            annulation: Annulation::new(),
            pause: Duration::ZERO,
            garde: GARDE_MIN,
        }
    }

    pub fn avec_annulation(mut self, annulation: Annulation) -> Self {
        self.annulation = annulation;
        self
    }

    pub fn avec_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn avec_garde(mut self, garde: usize) -> Self {
        self.garde = garde.max(GARDE_MIN);
        self
    }

    /// Point de suspension entre deux itérations : pause éventuelle puis
    /// consultation du jeton. Vrai si le calcul doit s’arrêter.
    pub fn interrompue(&self) -> bool {
        if !self.pause.is_zero() {
            std::thread::sleep(self.pause);
        }
        self.annulation.est_annule()
    }
}

/// Résultat d’un calcul en flux.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bilan {
    /// Chiffres après la virgule effectivement émis.
    pub chiffres: u64,
    pub annule: bool,
}
