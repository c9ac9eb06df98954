// src/noyau/erreur.rs
//
// Erreurs du noyau.
// - EntreeInvalide : requête mal formée (position ≤ 0, base inconnue…) → jamais fatale
// - DepassementArithmetique : précision / module hors limites → fin du calcul en cours
// - OracleIndisponible : calcul haute précision refusé (mémoire) → local à la requête

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ErreurPi {
    #[error("entrée invalide : {0}")]
    EntreeInvalide(String),

    #[error("dépassement arithmétique : {0}")]
    DepassementArithmetique(String),

    #[error("division par zéro")]
    DivisionParZero,

    #[error("oracle haute précision indisponible : {0}")]
    OracleIndisponible(String),

    #[error("écriture du journal : {0}")]
    Io(#[from] std::io::Error),

    #[error("calcul interrompu : {0}")]
    Interne(String),
}

impl ErreurPi {
    /// Vrai si l’erreur doit interrompre le calcul en cours (et seulement lui).
    pub fn est_fatale_au_calcul(&self) -> bool {
        matches!(
            self,
            ErreurPi::DepassementArithmetique(_) | ErreurPi::DivisionParZero | ErreurPi::Interne(_)
        )
    }
}
