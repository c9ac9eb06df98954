//! Noyau : chiffres de π
//!
//! Organisation interne :
//! - decimal.rs    : décimal à précision contrôlée (arrondi demi-haut / troncature)
//! - machin.rs     : Machin, recalcul à précision croissante + différence
//! - nilakantha.rs : série de Nilakantha à précision fixe (approximation assumée)
//! - spigot.rs     : spigot de Rabinowitz–Wagon, entiers exacts
//! - bbp.rs        : chiffre isolé (hex exact, décimal exact/approché)
//! - oracle.rs     : “π à N chiffres” en boîte noire
//! - flux.rs       : puits, journal, annulation, requête
//! - methode.rs    : choix de méthode + exécution journalisée
//! - erreur.rs     : erreurs du noyau

pub mod bbp;
pub mod decimal;
pub mod erreur;
pub mod flux;
pub mod machin;
pub mod methode;
pub mod nilakantha;
pub mod oracle;
pub mod spigot;

#[cfg(test)]
mod tests_scientifiques;

// API publique minimale
pub use bbp::{extrait, ChiffreExtrait, DemandeExtraction, StrategieDecimale};
pub use erreur::ErreurPi;
pub use flux::{Annulation, Bilan, Cible, Journal, Requete};
pub use methode::{calcul_journalise, Methode, Moteur};
pub use oracle::OracleEntier;
