// src/app/vue.rs
//
// Vue (UI egui)
// -------------
// - Choix de méthode (flux) ou chiffre isolé (BBP)
// - Démarrer / Arrêter ; Enter dans un champ = Démarrer
// - Transcription en direct, 80 colonnes, collée en bas pendant le flux

use eframe::egui;

use super::etat::{AppPi, Mode};
use crate::noyau::flux::LARGEUR_LIGNE;
use crate::noyau::{Methode, StrategieDecimale};

impl AppPi {
    /// UI principale : à appeler depuis eframe::App::update(...)
    pub fn ui(&mut self, ui: &mut egui::Ui) {
        ui.spacing_mut().item_spacing = egui::vec2(6.0, 6.0);

        ui.heading("Chiffres de π");
        ui.add_space(6.0);

        let libre = !self.occupe();
        ui.add_enabled_ui(libre, |ui| self.ui_choix(ui));

        ui.add_space(6.0);
        self.ui_commandes(ui);
        self.ui_messages(ui);

        ui.add_space(8.0);
        ui.separator();
        ui.add_space(8.0);

        self.ui_transcription(ui);
    }

    fn ui_choix(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            for m in Methode::TOUTES {
                ui.radio_value(&mut self.mode, Mode::Flux(m), m.libelle());
            }
            ui.radio_value(&mut self.mode, Mode::Extraction, "Chiffre isolé (BBP)");
        });

        ui.add_space(4.0);

        match self.mode {
            Mode::Flux(methode) => {
                ui.horizontal(|ui| {
                    let infini = self.infini && methode.accepte_infini();
                    ui.label("Chiffres :");
                    let resp = ui.add_enabled(
                        !infini,
                        egui::TextEdit::singleline(&mut self.saisie_chiffres)
                            .desired_width(120.0)
                            .id_source("saisie_chiffres"),
                    );
                    Self::entree_valide(ui, &resp, || self.demarrer());

                    ui.add_enabled_ui(methode.accepte_infini(), |ui| {
                        ui.checkbox(&mut self.infini, "sans fin");
                    });
                });
            }
            Mode::Extraction => self.ui_extraction(ui),
        }
    }

    fn ui_extraction(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Position :");
            let resp = ui.add(
                egui::TextEdit::singleline(&mut self.saisie_position)
                    .desired_width(120.0)
                    .id_source("saisie_position"),
            );
            Self::entree_valide(ui, &resp, || self.demarrer());

            ui.separator();
            ui.radio_value(&mut self.base, 16, "hex");
            ui.radio_value(&mut self.base, 10, "décimal");
        });

        if self.base == 10 {
            ui.horizontal(|ui| {
                ui.radio_value(&mut self.strategie, StrategieDecimale::Exacte, "exacte")
                    .on_hover_text("π complet jusqu’à la position (lent)");
                ui.radio_value(&mut self.strategie, StrategieDecimale::Approchee, "approchée")
                    .on_hover_text("Bloc hexadécimal converti (rapide, non garanti)");
            });
        }
    }

    fn ui_commandes(&mut self, ui: &mut egui::Ui) {
        let occupe = self.occupe();
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!occupe, egui::Button::new("Démarrer"))
                .clicked()
            {
                self.demarrer();
            }
            if ui
                .add_enabled(occupe, egui::Button::new("Arrêter"))
                .on_hover_text("Échap")
                .clicked()
            {
                self.arreter();
            }
            if ui
                .add_enabled(!occupe, egui::Button::new("Effacer"))
                .clicked()
            {
                self.effacer_messages();
                self.journal.vide();
            }

            if occupe {
                ui.spinner();
            }
            ui.label(&self.statut);
        });
    }

    fn ui_messages(&self, ui: &mut egui::Ui) {
        if let Some(c) = &self.extraction {
            let couleur = if c.approximatif() {
                ui.visuals().warn_fg_color
            } else {
                ui.visuals().text_color()
            };
            ui.add_space(4.0);
            ui.colored_label(couleur, c.to_string());
        }

        if !self.erreur.is_empty() {
            ui.add_space(4.0);
            ui.colored_label(ui.visuals().error_fg_color, &self.erreur);
        }
    }

    fn ui_transcription(&self, ui: &mut egui::Ui) {
        let texte = self.journal.texte_enveloppe(LARGEUR_LIGNE);
        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        ui.set_min_width(ui.available_width());
                        ui.monospace(texte);
                    });
            });
    }

    /// Enter dans un champ (qui perd alors le focus) déclenche l’action.
    fn entree_valide(ui: &egui::Ui, resp: &egui::Response, action: impl FnOnce()) {
        if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            action();
        }
    }
}
