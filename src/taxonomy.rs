//! Fixed review-area taxonomy for the Air Navigation Services questionnaire.
//!
//! The set is hand-curated and never derived from data. Canonical order is the
//! slice order of [`TAXONOMY`]; it drives category sort positions and the
//! scoring tie-break.

pub const ANS_QUESTIONNAIRE_KIND: &str = "USOAP_ANS";

pub const ANS_QUESTIONNAIRE_CODE: &str = "ANS-PQ";
pub const ANS_QUESTIONNAIRE_VERSION: &str = "2024.1";
pub const ANS_QUESTIONNAIRE_TITLE_EN: &str = "Air Navigation Services Protocol Questions";
pub const ANS_QUESTIONNAIRE_TITLE_FR: &str =
    "Questions de protocole relatives aux services de navigation aérienne";
pub const ANS_QUESTIONNAIRE_DESCRIPTION_EN: &str =
    "Protocol Questions grouped by ANS review area (GEN, ATM, FPD, AIM, MAP, CNS, MET, SAR).";
pub const ANS_QUESTIONNAIRE_DESCRIPTION_FR: &str =
    "Questions de protocole regroupées par domaine d'examen ANS (GEN, ATM, FPD, AIM, MAP, CNS, MET, SAR).";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetCategory {
    pub code: &'static str,
    pub name_en: &'static str,
    pub name_fr: &'static str,
    pub sort_order: i64,
    pub question_prefix: &'static str,
}

pub const TAXONOMY: &[TargetCategory] = &[
    TargetCategory {
        code: "GEN",
        name_en: "ANS Organization and Oversight",
        name_fr: "Organisation et supervision ANS",
        sort_order: 1,
        question_prefix: "GEN",
    },
    TargetCategory {
        code: "ATM",
        name_en: "Air Traffic Management",
        name_fr: "Gestion du trafic aérien",
        sort_order: 2,
        question_prefix: "ATM",
    },
    TargetCategory {
        code: "FPD",
        name_en: "Flight Procedure Design (PANS-OPS)",
        name_fr: "Conception des procédures de vol (PANS-OPS)",
        sort_order: 3,
        question_prefix: "FPD",
    },
    TargetCategory {
        code: "AIM",
        name_en: "Aeronautical Information Management",
        name_fr: "Gestion de l'information aéronautique",
        sort_order: 4,
        question_prefix: "AIM",
    },
    TargetCategory {
        code: "MAP",
        name_en: "Aeronautical Charts",
        name_fr: "Cartes aéronautiques",
        sort_order: 5,
        question_prefix: "MAP",
    },
    TargetCategory {
        code: "CNS",
        name_en: "Communications, Navigation and Surveillance",
        name_fr: "Communications, navigation et surveillance",
        sort_order: 6,
        question_prefix: "CNS",
    },
    TargetCategory {
        code: "MET",
        name_en: "Aeronautical Meteorology",
        name_fr: "Météorologie aéronautique",
        sort_order: 7,
        question_prefix: "MET",
    },
    TargetCategory {
        code: "SAR",
        name_en: "Search and Rescue",
        name_fr: "Recherche et sauvetage",
        sort_order: 8,
        question_prefix: "SAR",
    },
];

pub fn category_by_code(code: &str) -> Option<&'static TargetCategory> {
    TAXONOMY
        .iter()
        .find(|category| category.code.eq_ignore_ascii_case(code.trim()))
}

pub fn canonical_index(code: &str) -> Option<usize> {
    TAXONOMY
        .iter()
        .position(|category| category.code.eq_ignore_ascii_case(code.trim()))
}

pub fn all_codes() -> Vec<&'static str> {
    TAXONOMY.iter().map(|category| category.code).collect()
}

/// Authored stand-in question for a review area without source questions.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderQuestion {
    pub category_code: &'static str,
    pub question_en: &'static str,
    pub question_fr: &'static str,
    pub guidance_en: &'static str,
    pub references: &'static str,
}

pub const PLACEHOLDER_QUESTIONS: &[PlaceholderQuestion] = &[
    PlaceholderQuestion {
        category_code: "GEN",
        question_en: "Has the State established an ANS oversight organization with clearly defined responsibilities?",
        question_fr: "L'État a-t-il établi une organisation de supervision ANS dotée de responsabilités clairement définies ?",
        guidance_en: "Review the organizational chart and the instrument establishing the ANS oversight function.",
        references: "Annex 19, Chapter 3",
    },
    PlaceholderQuestion {
        category_code: "ATM",
        question_en: "Has the State established a process for the certification of air traffic services providers?",
        question_fr: "L'État a-t-il établi un processus de certification des fournisseurs de services de la circulation aérienne ?",
        guidance_en: "Review the certification procedures and a sample of issued certificates.",
        references: "Annex 11, 2.1",
    },
    PlaceholderQuestion {
        category_code: "FPD",
        question_en: "Has the State established a process for the approval of instrument flight procedures?",
        question_fr: "L'État a-t-il établi un processus d'approbation des procédures de vol aux instruments ?",
        guidance_en: "Review the approval procedure and records of recently approved procedures.",
        references: "Doc 8168; Doc 9906",
    },
    PlaceholderQuestion {
        category_code: "FPD",
        question_en: "Does the State ensure that instrument flight procedures are reviewed periodically?",
        question_fr: "L'État veille-t-il à ce que les procédures de vol aux instruments soient réexaminées périodiquement ?",
        guidance_en: "Verify the periodic review schedule and evidence of completed reviews.",
        references: "Doc 8168, Volume II",
    },
    PlaceholderQuestion {
        category_code: "AIM",
        question_en: "Has the State established an aeronautical information service?",
        question_fr: "L'État a-t-il établi un service d'information aéronautique ?",
        guidance_en: "Review the legal instrument and the AIP publication records.",
        references: "Annex 15, Chapter 2",
    },
    PlaceholderQuestion {
        category_code: "MAP",
        question_en: "Has the State ensured that aeronautical charts are made available in accordance with Annex 4?",
        question_fr: "L'État a-t-il veillé à ce que les cartes aéronautiques soient disponibles conformément à l'Annexe 4 ?",
        guidance_en: "Review a sample of published charts and the chart production procedures.",
        references: "Annex 4, Chapter 1",
    },
    PlaceholderQuestion {
        category_code: "CNS",
        question_en: "Has the State established requirements for the flight inspection of radio navigation aids?",
        question_fr: "L'État a-t-il établi des exigences relatives à l'inspection en vol des aides radio à la navigation ?",
        guidance_en: "Review the flight inspection requirements and recent inspection reports.",
        references: "Annex 10, Volume I; Doc 8071",
    },
    PlaceholderQuestion {
        category_code: "MET",
        question_en: "Has the State designated a meteorological authority?",
        question_fr: "L'État a-t-il désigné une administration météorologique ?",
        guidance_en: "Review the designation instrument and its notification to ICAO.",
        references: "Annex 3, 2.1.4",
    },
    PlaceholderQuestion {
        category_code: "SAR",
        question_en: "Has the State established a search and rescue organization?",
        question_fr: "L'État a-t-il établi une organisation de recherche et de sauvetage ?",
        guidance_en: "Review the legislation establishing SAR services and the rescue coordination centre arrangements.",
        references: "Annex 12, Chapter 2",
    },
    PlaceholderQuestion {
        category_code: "SAR",
        question_en: "Has the State concluded SAR agreements with neighbouring States?",
        question_fr: "L'État a-t-il conclu des accords SAR avec les États voisins ?",
        guidance_en: "Review the signed agreements and records of joint exercises.",
        references: "Annex 12, 3.1; Doc 9731",
    },
];

pub fn placeholders_for(code: &str) -> Vec<&'static PlaceholderQuestion> {
    PLACEHOLDER_QUESTIONS
        .iter()
        .filter(|placeholder| placeholder.category_code == code)
        .collect()
}
