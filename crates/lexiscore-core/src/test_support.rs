//! Shared fixtures for unit tests.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::analyzer::{collect_insights, text_metrics};
use crate::document::{AnnotatedDocument, DocumentBuilder, Number, Pos};
use crate::grammar::neutral_analysis;
use crate::lexicon::MemoryLexicon;
use crate::model::CefrLevel;
use crate::results::AnalysisResult;
use crate::traits::{NoFrequencies, NoLexicon, Synset, SynsetLemma};
use crate::vocabulary::VocabularyScorer;

/// `n` copies of "Tom writes long letters quickly." (five words each).
pub fn present_simple_doc(n: usize) -> AnnotatedDocument {
    let mut builder = DocumentBuilder::new();
    for _ in 0..n {
        builder = builder
            .push("Tom", "Tom", Pos::Propn, "NNP", "nsubj", 1)
            .number(Number::Sing)
            .push("writes", "write", Pos::Verb, "VBZ", "ROOT", 1)
            .number(Number::Sing)
            .push("long", "long", Pos::Adj, "JJ", "amod", 3)
            .push("letters", "letter", Pos::Noun, "NNS", "dobj", 1)
            .number(Number::Plur)
            .push("quickly", "quickly", Pos::Adv, "RB", "advmod", 1)
            .push(".", ".", Pos::Punct, ".", "punct", 1)
            .end_sentence();
    }
    builder.build()
}

/// Plain text of `n` whitespace-separated words.
pub fn words_text(n: usize) -> String {
    vec!["word"; n].join(" ")
}

pub fn lemma(name: &str) -> SynsetLemma {
    SynsetLemma {
        name: name.to_string(),
        antonyms: Vec::new(),
        derivations: Vec::new(),
    }
}

pub fn synset(id: &str, lexname: &str, depth: u32, lemmas: &[&str], hypernyms: &[&str]) -> Synset {
    Synset {
        id: id.to_string(),
        lexname: lexname.to_string(),
        definition: String::new(),
        examples: Vec::new(),
        lemmas: lemmas.iter().map(|l| lemma(l)).collect(),
        hypernyms: hypernyms.iter().map(|h| h.to_string()).collect(),
        hyponyms: Vec::new(),
        depth,
    }
}

/// A small noun taxonomy:
///
/// ```text
/// entity ─ object ─┬─ artifact ─┬─ letter
///                  │            └─ car (auto, automobile, machine)
///                  └─ animal ─── dog (domestic_dog, canis)
/// ```
/// plus an unconnected verb sense for "write".
pub fn tiny_lexicon() -> MemoryLexicon {
    let mut letter = synset(
        "letter.n.01",
        "noun.communication",
        3,
        &["letter", "missive"],
        &["artifact.n.01"],
    );
    letter.definition = "a written message addressed to a person".into();
    letter.examples = vec!["she wrote a letter to her friend".into()];

    let mut car = synset(
        "car.n.01",
        "noun.artifact",
        3,
        &["car", "auto", "automobile", "machine"],
        &["artifact.n.01"],
    );
    car.definition = "a motor vehicle with four wheels".into();

    let mut dog = synset(
        "dog.n.01",
        "noun.animal",
        3,
        &["dog", "domestic_dog", "canis"],
        &["animal.n.01"],
    );
    dog.lemmas[0].derivations = vec!["doggy".into()];

    let mut good = synset("good.a.01", "adj.all", 0, &["good", "fine", "decent"], &[]);
    good.lemmas[0].antonyms = vec!["bad".into()];

    let mut write = synset("write.v.01", "verb.communication", 0, &["write", "compose"], &[]);
    write.definition = "produce a literary work or a letter".into();
    write.lemmas[0].derivations = vec!["writer".into(), "writing".into()];

    let mut entity = synset("entity.n.01", "noun.Tops", 0, &["entity"], &[]);
    entity.hyponyms = vec!["object.n.01".into()];
    let mut object = synset("object.n.01", "noun.Tops", 1, &["object"], &["entity.n.01"]);
    object.hyponyms = vec!["artifact.n.01".into(), "animal.n.01".into()];
    let mut artifact = synset("artifact.n.01", "noun.Tops", 2, &["artifact"], &["object.n.01"]);
    artifact.hyponyms = vec!["letter.n.01".into(), "car.n.01".into()];
    let mut animal = synset("animal.n.01", "noun.Tops", 2, &["animal"], &["object.n.01"]);
    animal.hyponyms = vec!["dog.n.01".into()];

    MemoryLexicon::new(vec![
        entity, object, artifact, animal, letter, car, dog, good, write,
    ])
}

/// A finished analysis at `level` with every aspect unused and no weak areas.
/// Tests adjust the grammar and weak-area fields they care about.
pub fn analysis_fixture(level: CefrLevel) -> AnalysisResult {
    let grammar = neutral_analysis("fixture");
    let vocabulary = VocabularyScorer::new(Arc::new(NoLexicon), Arc::new(NoFrequencies))
        .analyze(&present_simple_doc(19));
    AnalysisResult {
        id: Uuid::new_v4(),
        text: text_metrics("One. Two.", 2),
        insights: collect_insights(&grammar, &vocabulary),
        estimated_level: level,
        confidence: 50.0,
        preliminary_score: 60.0,
        preliminary_cefr: level,
        weak_areas: Vec::new(),
        unused_aspects: grammar.unused_aspects.clone(),
        specific_errors: Vec::new(),
        recommendations: Vec::new(),
        processing_ms: 1,
        analyzed_at: Utc::now(),
        grammar,
        vocabulary,
    }
}
