// src/main.rs
//
// Chiffres de π : point d’entrée NATIF
// ------------------------------------
// - Journalisation : tracing + filtre RUST_LOG (défaut : pi_chiffres=info)
// - Réglages       : variables PI_CHIFFRES_* (voir config.rs)
// - À la fermeture : le calcul en flux encore actif est annulé et sa transcription écrite

use eframe::egui;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod noyau;

use app::{AppPi, Fermeture};
use config::Reglages;
use noyau::Journal;

const TITRE_APP: &str = "Chiffres de π";

fn installer_journalisation() {
    let filtre =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pi_chiffres=info"));
    tracing_subscriber::fmt().with_env_filter(filtre).init();
}

fn main() -> eframe::Result<()> {
    installer_journalisation();

    let reglages = Reglages::depuis_env();
    let dossier = reglages.dossier.clone();
    info!(dossier = %dossier.display(), "démarrage");

    let fermeture = Fermeture::new(Journal::new());
    let fermeture_app = fermeture.clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(TITRE_APP)
            .with_inner_size([760.0, 720.0])
            .with_min_inner_size([520.0, 480.0]),
        ..Default::default()
    };

    let resultat = eframe::run_native(
        TITRE_APP,
        options,
        Box::new(move |_cc| Ok(Box::new(AppPi::new(reglages, fermeture_app)))),
    );

    fermeture.fermer(&dossier);
    resultat
}
