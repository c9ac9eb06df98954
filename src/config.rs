// src/config.rs
//
// Réglages (valeurs par défaut + surcharge par variables d’environnement).
// Une valeur illisible est signalée puis ignorée : on garde le défaut.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::noyau::flux::GARDE_MIN;

const DOSSIER_DEFAUT: &str = ".";
const PAUSE_MS_DEFAUT: u64 = 0;
const PRECISION_NILAKANTHA_DEFAUT: usize = 100;
const LIMITE_ORACLE_DEFAUT: usize = 200_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reglages {
    /// Dossier des transcriptions `<méthode>.txt`.
    pub dossier: PathBuf,
    /// Pause entre deux itérations (rythme d’affichage).
    pub pause: Duration,
    pub garde: usize,
    /// Précision fixe de Nilakantha en mode infini.
    pub precision_nilakantha: usize,
    /// Au-delà, l’oracle refuse (mémoire).
    pub limite_oracle: usize,
}

impl Default for Reglages {
    fn default() -> Self {
        Self {
            dossier: PathBuf::from(DOSSIER_DEFAUT),
            pause: Duration::from_millis(PAUSE_MS_DEFAUT),
            garde: GARDE_MIN,
            precision_nilakantha: PRECISION_NILAKANTHA_DEFAUT,
            limite_oracle: LIMITE_ORACLE_DEFAUT,
        }
    }
}

impl Reglages {
    pub fn depuis_env() -> Self {
        Self::depuis(|cle| env::var(cle).ok())
    }

    /// Lecture à partir d’une source quelconque (tests : pas de variables globales).
    pub fn depuis(source: impl Fn(&str) -> Option<String>) -> Self {
        let defaut = Self::default();

        let dossier = source("PI_CHIFFRES_DOSSIER")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaut.dossier);

        let pause_ms = lire(&source, "PI_CHIFFRES_PAUSE_MS", PAUSE_MS_DEFAUT);
        let garde = lire(&source, "PI_CHIFFRES_GARDE", defaut.garde);
        if garde < GARDE_MIN {
            warn!(garde, min = GARDE_MIN, "garde trop faible, relevée au minimum");
        }

        Self {
            dossier,
            pause: Duration::from_millis(pause_ms),
            garde: garde.max(GARDE_MIN),
            precision_nilakantha: lire(
                &source,
                "PI_CHIFFRES_PRECISION_NILAKANTHA",
                defaut.precision_nilakantha,
            ),
            limite_oracle: lire(&source, "PI_CHIFFRES_LIMITE_ORACLE", defaut.limite_oracle),
        }
    }
}

fn lire<T: FromStr + Copy>(source: &impl Fn(&str) -> Option<String>, cle: &str, defaut: T) -> T {
    match source(cle) {
        None => defaut,
        Some(brut) => brut.trim().parse().unwrap_or_else(|_| {
            warn!(cle, valeur = %brut, "réglage illisible, valeur par défaut conservée");
            defaut
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn depuis_table(paires: &[(&str, &str)]) -> Reglages {
        let table: HashMap<String, String> = paires
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Reglages::depuis(|cle| table.get(cle).cloned())
    }

    #[test]
    fn defauts_sans_variables() {
        assert_eq!(depuis_table(&[]), Reglages::default());
    }

    #[test]
    fn surcharges() {
        let r = depuis_table(&[
            ("PI_CHIFFRES_DOSSIER", "/tmp/pi"),
            ("PI_CHIFFRES_PAUSE_MS", "100"),
            ("PI_CHIFFRES_PRECISION_NILAKANTHA", "250"),
        ]);
        assert_eq!(r.dossier, PathBuf::from("/tmp/pi"));
        assert_eq!(r.pause, Duration::from_millis(100));
        assert_eq!(r.precision_nilakantha, 250);
        assert_eq!(r.limite_oracle, LIMITE_ORACLE_DEFAUT);
    }

    #[test]
    fn valeurs_invalides_ignorees() {
        let r = depuis_table(&[("PI_CHIFFRES_PAUSE_MS", "vite"), ("PI_CHIFFRES_GARDE", "3")]);
        assert_eq!(r.pause, Duration::ZERO);
        assert_eq!(r.garde, GARDE_MIN);
    }
}
