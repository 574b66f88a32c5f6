//! # Modelo NER Embutido
//!
//! O modelo encapsula:
//! - **Pesos CRF** definidos à mão a partir de padrões do inglês (capitalização,
//!   títulos, preposições de lugar, sufixos corporativos)
//! - **Gazetteers** de pessoas, organizações, entidades geopolíticas, lugares e
//!   nacionalidades
//! - **Motor de Regras** alimentado pelas mesmas listas
//!
//! ## Como os pesos foram derivados
//!
//! Os pesos são heurísticos. Em um sistema real seriam estimados por máxima
//! verossimilhança condicional (L-BFGS) sobre um corpus anotado; aqui
//! codificamos diretamente os padrões mais fortes do inglês jornalístico.

use crate::crf::CrfModel;
use crate::features::{is_stopword, Gazetteers};
use crate::rule_based::RuleEngine;
use crate::tagger::{EntityCategory, Tag};

/// O modelo NER completo: pesos do CRF, motor de regras e gazetteers.
///
/// É imutável depois de construído, então pode ser compartilhado entre threads.
#[derive(Debug, Clone)]
pub struct NerModel {
    pub crf: CrfModel,
    /// Motor de regras com os gazetteers de frases (multi-palavra)
    pub rule_engine: RuleEngine,
    /// Gazetteers por palavra, usados pelo extrator de features
    gazetteers: Gazetteers,
}

impl NerModel {
    /// Constrói o modelo padrão com pesos heurísticos e as listas embutidas.
    pub fn build() -> Self {
        let mut rule_engine = RuleEngine::new();
        let gazetteers = build_gazetteers(&mut rule_engine);

        Self {
            crf: build_crf_model(),
            rule_engine,
            gazetteers,
        }
    }

    /// Gazetteers por palavra para o extrator de features (`in_person_gazetteer` etc.).
    pub fn gazetteers(&self) -> &Gazetteers {
        &self.gazetteers
    }
}

impl Default for NerModel {
    fn default() -> Self {
        Self::build()
    }
}

/// Constrói o modelo CRF com pesos heurísticos.
///
/// # Exemplos de Intuição
/// - Palavra nos **gazetteers de pessoa** → `B-PER` muito mais provável (+5.0).
/// - Palavra capitalizada → provável início de entidade (+2.8 para `B-PER`).
/// - Palavra anterior "President" → a próxima provavelmente é `B-PER` (+2.5).
fn build_crf_model() -> CrfModel {
    let mut model = CrfModel::new();
    let begin = Tag::Begin;
    let inside = Tag::Inside;

    // =====================================================================
    // PESOS DE EMISSÃO (Feature -> Tag)
    // =====================================================================

    // Viés: a maioria dos tokens é Outside
    model.set_emission("bias", &Tag::Outside, 1.0);
    for cat in EntityCategory::ALL {
        model.set_emission("bias", &begin(cat), -1.0);
        model.set_emission("bias", &inside(cat), -2.0);
        // Continuação: palavra capitalizada logo após outra capitalizada
        model.set_emission("is_capitalized", &inside(cat), 3.0);
        model.set_emission("prev_is_capitalized", &inside(cat), 1.0);
    }

    // --- Capitalização ---
    model.set_emission("is_capitalized", &begin(EntityCategory::Per), 2.8);
    model.set_emission("is_capitalized", &begin(EntityCategory::Org), 1.5);
    model.set_emission("is_capitalized", &begin(EntityCategory::Gpe), 1.5);
    model.set_emission("is_capitalized", &begin(EntityCategory::Loc), 1.0);
    model.set_emission("is_capitalized", &begin(EntityCategory::Misc), 1.0);

    // Siglas: NASA, FBI, UN
    model.set_emission("is_all_caps", &begin(EntityCategory::Org), 2.0);
    model.set_emission("is_all_caps", &begin(EntityCategory::Per), -1.5);

    // --- Gazetteers: o sinal mais forte ---
    let gazetteer_features = [
        ("in_person_gazetteer", EntityCategory::Per),
        ("in_org_gazetteer", EntityCategory::Org),
        ("in_gpe_gazetteer", EntityCategory::Gpe),
        ("in_location_gazetteer", EntityCategory::Loc),
        ("in_misc_gazetteer", EntityCategory::Misc),
    ];
    for (feature, cat) in gazetteer_features {
        model.set_emission(feature, &begin(cat), 5.0);
        model.set_emission(feature, &inside(cat), 4.5);
    }

    // --- PESSOA (PER): títulos e verbos de fala ---
    for title in [
        "mr.", "mrs.", "ms.", "dr.", "prof.", "president", "senator", "governor",
        "minister", "chancellor", "judge", "general", "mayor", "sir", "ceo",
    ] {
        model.set_emission(&format!("prev_word={title}"), &begin(EntityCategory::Per), 2.5);
    }
    for verb in ["said", "says", "told", "according"] {
        model.set_emission(&format!("prev_word={verb}"), &begin(EntityCategory::Per), 1.5);
    }

    // --- ORGANIZAÇÃO (ORG): sufixos corporativos adiante ---
    for suffix in ["inc.", "inc", "corp.", "corp", "ltd.", "ltd", "llc", "plc", "group", "co."] {
        model.set_emission(&format!("next_word={suffix}"), &begin(EntityCategory::Org), 2.5);
        model.set_emission(&format!("word={suffix}"), &inside(EntityCategory::Org), 3.0);
    }
    for head in ["university", "bank", "institute", "agency", "committee", "council"] {
        model.set_emission(&format!("word={head}"), &begin(EntityCategory::Org), 1.5);
        model.set_emission(&format!("word={head}"), &inside(EntityCategory::Org), 1.5);
    }
    model.set_emission("suffix4=tech", &begin(EntityCategory::Org), 1.2);
    model.set_emission("prev_word=at", &begin(EntityCategory::Org), 0.8);
    model.set_emission("prev_word=joined", &begin(EntityCategory::Org), 1.2);

    // --- GPE / LOC: preposições de lugar ---
    for prep in ["in", "from", "to", "across", "near"] {
        model.set_emission(&format!("prev_word={prep}"), &begin(EntityCategory::Gpe), 1.0);
        model.set_emission(&format!("prev_word={prep}"), &begin(EntityCategory::Loc), 0.5);
    }
    for cue in ["city", "state", "country", "capital"] {
        model.set_emission(&format!("prev2_word={cue}"), &begin(EntityCategory::Gpe), 1.0);
    }
    for cue in ["river", "mount", "lake", "ocean", "sea", "valley"] {
        model.set_emission(&format!("word={cue}"), &begin(EntityCategory::Loc), 1.5);
        model.set_emission(&format!("word={cue}"), &inside(EntityCategory::Loc), 1.5);
    }

    // --- MISC: gentílicos ---
    for suffix in ["ish", "ian", "ese"] {
        model.set_emission(&format!("suffix3={suffix}"), &begin(EntityCategory::Misc), 1.0);
    }

    // --- Outside ---
    model.set_emission("BOS", &Tag::Outside, 0.5);
    model.set_emission("is_stopword", &Tag::Outside, 4.0);
    model.set_emission("is_punctuation", &Tag::Outside, 5.0);
    // Números isolados: anos, quantidades
    model.set_emission("is_digit", &Tag::Outside, 2.0);

    // =====================================================================
    // PESOS DE TRANSIÇÃO
    // =====================================================================

    let tags = Tag::all();
    for prev in &tags {
        for next in &tags {
            if !Tag::is_valid_transition(prev, next) {
                model.set_transition(prev, next, -8.0);
            }
        }
    }

    for cat in EntityCategory::ALL {
        let b = begin(cat);
        let i = inside(cat);
        model.set_transition(&b, &i, 1.5);
        model.set_transition(&i, &i, 1.0);
        model.set_transition(&b, &Tag::Outside, 1.0);
        model.set_transition(&i, &Tag::Outside, 1.0);
        model.set_transition(&Tag::Outside, &b, 0.5);
    }
    model.set_transition(&Tag::Outside, &Tag::Outside, 1.0);

    model
}

const PERSONS: &[&str] = &[
    // Primeiros nomes comuns
    "Alice", "Bob", "Carol", "David", "Emma", "Frank", "Grace", "Henry", "Isabel",
    "James", "John", "Mary", "Michael", "Sarah", "Robert", "Linda", "William",
    "Elizabeth", "Thomas", "Susan", "Charles", "Jennifer", "Daniel", "Laura",
    "Peter", "Anna", "George", "Maria", "Paul", "Helen",
    // Figuras públicas
    "Barack Obama", "Joe Biden", "Donald Trump", "Angela Merkel", "Emmanuel Macron",
    "Winston Churchill", "Abraham Lincoln", "Albert Einstein", "Marie Curie",
    "Isaac Newton", "Charles Darwin", "Ada Lovelace", "Alan Turing",
    "Elon Musk", "Bill Gates", "Steve Jobs", "Warren Buffett", "Jeff Bezos",
    "Taylor Swift", "Serena Williams", "Lionel Messi", "Shakespeare",
];

const ORGANIZATIONS: &[&str] = &[
    "United Nations", "European Union", "World Bank", "World Health Organization",
    "International Monetary Fund", "NATO", "UNESCO", "UNICEF", "NASA", "FBI", "CIA",
    "Federal Reserve", "Supreme Court", "Congress", "Senate", "Parliament",
    "Google", "Microsoft", "Apple", "Amazon", "Tesla", "IBM", "Intel", "Netflix",
    "Bank of America", "Goldman Sachs", "JPMorgan", "Toyota", "Volkswagen",
    "Harvard University", "Stanford University", "Oxford University", "MIT",
    "Reuters", "BBC", "CNN", "The New York Times", "Associated Press",
];

const GPES: &[&str] = &[
    "United States", "United Kingdom", "Canada", "Mexico", "Brazil", "Argentina",
    "France", "Germany", "Italy", "Spain", "Portugal", "Russia", "China", "Japan",
    "India", "Australia", "Egypt", "Nigeria", "Kenya", "South Africa", "Ukraine",
    "America", "Britain", "England", "Scotland", "Ireland", "Israel", "Iran",
    "California", "Texas", "Florida", "New York", "New York City", "Washington",
    "London", "Paris", "Berlin", "Madrid", "Rome", "Tokyo", "Beijing", "Moscow",
    "Boston", "Chicago", "Los Angeles", "San Francisco", "Seattle", "Toronto",
    "Sydney", "Mumbai", "Cairo", "Lagos", "Lisbon", "Dublin",
];

const LOCATIONS: &[&str] = &[
    "Europe", "Asia", "Africa", "Antarctica", "North America", "South America",
    "Atlantic Ocean", "Pacific Ocean", "Indian Ocean", "Mediterranean",
    "Amazon River", "Nile", "Mississippi River", "Thames", "Danube",
    "Mount Everest", "Alps", "Rocky Mountains", "Himalayas", "Sahara",
    "Silicon Valley", "Middle East", "Caribbean", "Arctic",
];

const MISC: &[&str] = &[
    "American", "British", "English", "French", "German", "Italian", "Spanish",
    "Chinese", "Japanese", "Russian", "Indian", "Canadian", "Mexican", "Brazilian",
    "European", "African", "Asian", "Christian", "Muslim", "Jewish", "Buddhist",
    "Democrats", "Republicans", "Democratic", "Republican",
];

/// Alimenta o motor de regras com as frases e retorna os gazetteers por palavra.
fn build_gazetteers(rule_engine: &mut RuleEngine) -> Gazetteers {
    let mut gaz = Gazetteers::default();

    let lists = [
        (PERSONS, EntityCategory::Per),
        (ORGANIZATIONS, EntityCategory::Org),
        (GPES, EntityCategory::Gpe),
        (LOCATIONS, EntityCategory::Loc),
        (MISC, EntityCategory::Misc),
    ];
    for (names, cat) in lists {
        for name in names {
            rule_engine.add(cat, name);
            let words = match cat {
                EntityCategory::Per => &mut gaz.persons,
                EntityCategory::Org => &mut gaz.organizations,
                EntityCategory::Gpe => &mut gaz.gpes,
                EntityCategory::Loc => &mut gaz.locations,
                EntityCategory::Misc => &mut gaz.misc,
            };
            // Palavras soltas: "of" em "Bank of America" não é pista de nada
            for word in name.split_whitespace() {
                let lower = word.to_lowercase();
                if lower.chars().count() > 2 && !is_stopword(&lower) {
                    words.insert(lower);
                }
            }
        }
    }

    gaz
}
