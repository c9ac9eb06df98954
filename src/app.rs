// src/app.rs
//
// Chiffres de π : module App (racine)
// -----------------------------------
// Rôle:
// - Déclarer les sous-modules (etat.rs + travail.rs + vue.rs)
// - Ré-exporter AppPi / Fermeture (pour main.rs)
// - Fournir l’impl eframe::App

pub mod etat;
pub mod travail;
pub mod vue;

pub use etat::AppPi;
pub use travail::Fermeture;

use std::time::Duration;

use eframe::egui;

/// Rythme de rafraîchissement pendant un calcul (le journal grossit hors frame).
const RAFRAICHISSEMENT: Duration = Duration::from_millis(100);

impl eframe::App for AppPi {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Récolte d’un calcul terminé avant de dessiner.
        self.sonder();

        // ESC = arrêter le calcul en cours (comme le bouton "Arrêter").
        let esc = ctx.input(|i| i.key_pressed(egui::Key::Escape));
        if esc {
            self.arreter();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.ui(ui);
        });

        if self.occupe() {
            ctx.request_repaint_after(RAFRAICHISSEMENT);
        }
    }
}
