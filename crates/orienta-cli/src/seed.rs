//! Reference sector catalog.
//!
//! The classifiers resolve keyword-table codes against `secteurs.code`, so
//! a fresh database needs this catalog before any classification job can
//! run. Seeding is idempotent: sector rows are keyed by their stable code,
//! métiers are only inserted the first time their sector is created.

use orienta_core::Result;
use orienta_store::{NewSecteur, Store};

struct SeedSecteur {
    titre: &'static str,
    code: &'static str,
    mots_cles: &'static [&'static str],
    metiers: &'static [&'static str],
    salaire: (i64, i64),
}

const SECTEURS: &[SeedSecteur] = &[
    SeedSecteur {
        titre: "Santé",
        code: "SANTE",
        mots_cles: &["médecine", "soins", "paramédical", "clinique"],
        metiers: &["Médecin généraliste", "Infirmier", "Pharmacien", "Chirurgien-dentiste"],
        salaire: (6000, 40000),
    },
    SeedSecteur {
        titre: "Informatique & Digital",
        code: "TECH",
        mots_cles: &["informatique", "développement", "data", "digital"],
        metiers: &["Développeur", "Data scientist", "Administrateur systèmes"],
        salaire: (7000, 35000),
    },
    SeedSecteur {
        titre: "Mode & Beauté",
        code: "MODE",
        mots_cles: &["mode", "stylisme", "esthétique"],
        metiers: &["Styliste", "Modéliste", "Esthéticien"],
        salaire: (4000, 20000),
    },
    SeedSecteur {
        titre: "Droit & Sciences Politiques",
        code: "DROIT",
        mots_cles: &["droit", "juridique", "justice"],
        metiers: &["Avocat", "Notaire", "Juriste d'entreprise"],
        salaire: (6000, 45000),
    },
    SeedSecteur {
        titre: "Gestion & Commerce",
        code: "GESTION",
        mots_cles: &["gestion", "commerce", "management", "marketing"],
        metiers: &["Responsable commercial", "Chef de produit", "Gestionnaire"],
        salaire: (5000, 30000),
    },
    SeedSecteur {
        titre: "Ingénierie",
        code: "INGENIERIE",
        mots_cles: &["ingénierie", "génie", "industrie"],
        metiers: &["Ingénieur d'état", "Chef de projet industriel"],
        salaire: (8000, 40000),
    },
    SeedSecteur {
        titre: "Agriculture & Agroalimentaire",
        code: "AGRO",
        mots_cles: &["agriculture", "agronomie", "agroalimentaire"],
        metiers: &["Ingénieur agronome", "Vétérinaire"],
        salaire: (5000, 25000),
    },
    SeedSecteur {
        titre: "Tourisme & Hôtellerie",
        code: "TOURISME",
        mots_cles: &["tourisme", "hôtellerie", "restauration"],
        metiers: &["Guide touristique", "Directeur d'hôtel", "Chef cuisinier"],
        salaire: (4000, 25000),
    },
    SeedSecteur {
        titre: "Enseignement & Éducation",
        code: "EDUCATION",
        mots_cles: &["enseignement", "éducation", "pédagogie"],
        metiers: &["Professeur", "Conseiller pédagogique"],
        salaire: (5000, 18000),
    },
    SeedSecteur {
        titre: "Architecture & BTP",
        code: "BTP",
        mots_cles: &["architecture", "bâtiment", "travaux publics"],
        metiers: &["Architecte", "Conducteur de travaux", "Urbaniste"],
        salaire: (6000, 35000),
    },
    SeedSecteur {
        titre: "Art & Design",
        code: "ART",
        mots_cles: &["art", "design", "création"],
        metiers: &["Designer graphique", "Illustrateur", "Directeur artistique"],
        salaire: (4000, 22000),
    },
    SeedSecteur {
        titre: "Communication & Médias",
        code: "COM",
        mots_cles: &["communication", "journalisme", "médias"],
        metiers: &["Journaliste", "Chargé de communication", "Community manager"],
        salaire: (4500, 25000),
    },
    SeedSecteur {
        titre: "Banque & Finance",
        code: "FINANCE",
        mots_cles: &["banque", "finance", "comptabilité", "assurance"],
        metiers: &["Analyste financier", "Expert-comptable", "Actuaire"],
        salaire: (6000, 45000),
    },
    SeedSecteur {
        titre: "Télécommunications & Réseaux",
        code: "TELECOM",
        mots_cles: &["télécommunications", "réseaux"],
        metiers: &["Ingénieur télécoms", "Technicien réseaux"],
        salaire: (6000, 30000),
    },
    SeedSecteur {
        titre: "Transport & Logistique",
        code: "TRANSPORT",
        mots_cles: &["transport", "logistique", "supply chain"],
        metiers: &["Responsable logistique", "Pilote de ligne", "Transitaire"],
        salaire: (5000, 60000),
    },
    SeedSecteur {
        titre: "Sciences Fondamentales",
        code: "SCIENCES",
        mots_cles: &["mathématiques", "physique", "chimie", "biologie"],
        metiers: &["Chercheur", "Enseignant-chercheur", "Statisticien"],
        salaire: (6000, 28000),
    },
];

/// Seed the sector catalog. Returns (sectors present, métiers inserted).
pub fn seed_secteurs(store: &Store) -> Result<(usize, usize)> {
    let mut metiers_inserted = 0;
    for seed in SECTEURS {
        let already = store.get_secteur_by_code(seed.code)?.is_some();
        let id = store.add_secteur(&NewSecteur {
            titre: seed.titre.to_string(),
            code: seed.code.to_string(),
            mots_cles: seed.mots_cles.iter().map(|s| s.to_string()).collect(),
            metiers: seed.metiers.iter().map(|s| s.to_string()).collect(),
            salaire_min: Some(seed.salaire.0),
            salaire_max: Some(seed.salaire.1),
            is_active: true,
        })?;
        if !already {
            for metier in seed.metiers {
                store.add_metier(id, metier, true)?;
                metiers_inserted += 1;
            }
        }
    }
    Ok((SECTEURS.len(), metiers_inserted))
}
