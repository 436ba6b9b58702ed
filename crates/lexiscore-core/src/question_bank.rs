//! Built-in diagnostic question bank.

use std::sync::OnceLock;

use crate::model::{CefrLevel, GrammarAspect, QuestionType, TestQuestion};

/// IRT `(difficulty, discrimination)` for a question pitched at `level`.
pub fn irt_params(level: CefrLevel) -> (f64, f64) {
    match level {
        CefrLevel::A1 => (0.2, 0.8),
        CefrLevel::A2 => (0.4, 1.0),
        CefrLevel::B1 => (0.6, 1.2),
        CefrLevel::B2 => (0.8, 1.4),
        CefrLevel::C1 | CefrLevel::C2 => (1.0, 1.6),
    }
}

/// Build a question with IRT parameters derived from its level.
#[allow(clippy::too_many_arguments)]
pub fn question(
    id: &str,
    question_type: QuestionType,
    aspect: GrammarAspect,
    prompt: &str,
    options: &[&str],
    correct_answer: &str,
    difficulty: CefrLevel,
    topic: &str,
) -> TestQuestion {
    let (difficulty_param, discrimination_param) = irt_params(difficulty);
    TestQuestion {
        id: id.to_string(),
        question_type,
        aspect,
        question: prompt.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_answer: correct_answer.to_string(),
        difficulty,
        topic: topic.to_string(),
        difficulty_param,
        discrimination_param,
    }
}

/// The bank shipped with the crate, built once per process.
pub fn default_bank() -> &'static [TestQuestion] {
    static BANK: OnceLock<Vec<TestQuestion>> = OnceLock::new();
    BANK.get_or_init(build_bank)
}

fn build_bank() -> Vec<TestQuestion> {
    use CefrLevel::*;
    use GrammarAspect as G;
    use QuestionType as T;

    vec![
        // A1
        question(
            "g_t_1",
            T::GrammarTenses,
            G::PresentSimple,
            "She ______ to school every day.",
            &["go", "goes", "went", "going"],
            "goes",
            A1,
            "present_simple",
        ),
        question(
            "g_t_2",
            T::GrammarTenses,
            G::PastSimple,
            "They ______ football yesterday.",
            &["play", "plays", "played", "playing"],
            "played",
            A1,
            "past_simple",
        ),
        question(
            "g_t_4",
            T::GrammarTenses,
            G::PresentContinuous,
            "Look! It ______ outside.",
            &["rain", "rains", "is raining", "rained"],
            "is raining",
            A1,
            "present_continuous",
        ),
        question(
            "g_a_1",
            T::GrammarArticles,
            G::Articles,
            "She is ______ honest person.",
            &["a", "an", "the", "-"],
            "an",
            A1,
            "articles",
        ),
        question(
            "g_p_1",
            T::GrammarPrepositions,
            G::Prepositions,
            "My birthday is ______ May.",
            &["on", "at", "in", "by"],
            "in",
            A1,
            "prepositions_of_time",
        ),
        question(
            "v_c_2",
            T::VocabularyComplexity,
            G::VocabularyUsage,
            "The opposite of 'big' is ______.",
            &["tall", "small", "long", "heavy"],
            "small",
            A1,
            "basic_adjectives",
        ),
        question(
            "v_a_2",
            T::VocabularyAppropriateness,
            G::VocabularyUsage,
            "You meet your teacher in the morning. You say: '______'",
            &["Good morning", "Yo", "Good night", "See ya"],
            "Good morning",
            A1,
            "greetings",
        ),
        // A2
        question(
            "g_t_5",
            T::GrammarTenses,
            G::PastContinuous,
            "I ______ TV when she called.",
            &["watched", "was watching", "am watching", "have watched"],
            "was watching",
            A2,
            "past_continuous",
        ),
        question(
            "g_t_6",
            T::GrammarTenses,
            G::FutureSimple,
            "I think it ______ rain tomorrow.",
            &["is", "will", "does", "was"],
            "will",
            A2,
            "future_simple",
        ),
        question(
            "g_a_2",
            T::GrammarArticles,
            G::Articles,
            "My brother plays ______ piano very well.",
            &["a", "an", "the", "-"],
            "the",
            A2,
            "articles",
        ),
        question(
            "g_p_2",
            T::GrammarPrepositions,
            G::Prepositions,
            "We usually meet ______ Monday evenings.",
            &["in", "on", "at", "for"],
            "on",
            A2,
            "prepositions_of_time",
        ),
        question(
            "v_c_3",
            T::VocabularyComplexity,
            G::VocabularyUsage,
            "The film was so ______ that I fell asleep.",
            &["boring", "bored", "exciting", "excited"],
            "boring",
            A2,
            "participle_adjectives",
        ),
        question(
            "v_a_3",
            T::VocabularyAppropriateness,
            G::VocabularyUsage,
            "In an email to a shop, you ask: '______ send me the price list?'",
            &["Could you please", "Gimme", "Send", "You must"],
            "Could you please",
            A2,
            "polite_requests",
        ),
        question(
            "v_l_1",
            T::VocabularyCollocations,
            G::VocabularyCollocations,
            "Have you ______ your homework yet?",
            &["made", "done", "taken", "had"],
            "done",
            A2,
            "make_do",
        ),
        // B1
        question(
            "g_t_3",
            T::GrammarTenses,
            G::PresentPerfect,
            "I ______ here since 2010.",
            &["live", "lived", "have lived", "am living"],
            "have lived",
            B1,
            "present_perfect",
        ),
        question(
            "g_t_7",
            T::GrammarTenses,
            G::PastPerfect,
            "When we arrived, the film ______.",
            &["already started", "has already started", "had already started", "starts"],
            "had already started",
            B1,
            "past_perfect",
        ),
        question(
            "g_c_1",
            T::GrammarConditionals,
            G::Conditionals,
            "If it rains tomorrow, we ______ at home.",
            &["stay", "will stay", "would stay", "stayed"],
            "will stay",
            B1,
            "first_conditional",
        ),
        question(
            "g_a_3",
            T::GrammarArticles,
            G::Articles,
            "______ Nile is the longest river in Africa.",
            &["A", "An", "The", "-"],
            "The",
            B1,
            "articles_geography",
        ),
        question(
            "g_p_3",
            T::GrammarPrepositions,
            G::Prepositions,
            "She is really good ______ maths.",
            &["in", "at", "on", "for"],
            "at",
            B1,
            "dependent_prepositions",
        ),
        question(
            "v_c_4",
            T::VocabularyComplexity,
            G::VocabularyUsage,
            "The new law had a huge ______ on small businesses.",
            &["affect", "effect", "effort", "afford"],
            "effect",
            B1,
            "confusable_words",
        ),
        question(
            "v_a_1",
            T::VocabularyAppropriateness,
            G::VocabularyUsage,
            "In a formal letter, it's better to write 'I am writing to ______' instead of 'I wanna'.",
            &["complain", "inform you", "let you know", "tell you"],
            "inform you",
            B1,
            "formal_vocabulary",
        ),
        question(
            "v_l_2",
            T::VocabularyCollocations,
            G::VocabularyCollocations,
            "It took her a long time to ______ a decision.",
            &["do", "make", "take over", "get"],
            "make",
            B1,
            "make_do",
        ),
        // B2
        question(
            "g_t_8",
            T::GrammarTenses,
            G::FutureContinuous,
            "This time tomorrow I ______ on the beach.",
            &["lie", "will be lying", "will have lain", "am lying"],
            "will be lying",
            B2,
            "future_continuous",
        ),
        question(
            "g_t_9",
            T::GrammarTenses,
            G::PassiveVoice,
            "The bridge ______ in 1990.",
            &["built", "was built", "has built", "was building"],
            "was built",
            B2,
            "passive_voice",
        ),
        question(
            "g_c_2",
            T::GrammarConditionals,
            G::Conditionals,
            "If I ______ you, I would apologise.",
            &["am", "was being", "were", "had"],
            "were",
            B2,
            "second_conditional",
        ),
        question(
            "g_p_4",
            T::GrammarPrepositions,
            G::Prepositions,
            "The result will depend ______ the weather.",
            &["of", "from", "on", "at"],
            "on",
            B2,
            "dependent_prepositions",
        ),
        question(
            "v_c_1",
            T::VocabularyComplexity,
            G::VocabularyUsage,
            "The company decided to ______ the new project due to budget constraints.",
            &["terminate", "cease", "abandon", "conclude"],
            "abandon",
            B2,
            "advanced_vocabulary",
        ),
        question(
            "v_a_4",
            T::VocabularyAppropriateness,
            G::VocabularyUsage,
            "In a report, 'a lot of people think' is better written as '______ believe'.",
            &["loads of folks", "many respondents", "tons of guys", "everybody"],
            "many respondents",
            B2,
            "academic_register",
        ),
        // C1
        question(
            "g_t_10",
            T::GrammarTenses,
            G::FuturePerfect,
            "By 2030 engineers ______ the tunnel.",
            &["will finish", "will have finished", "finish", "are finishing"],
            "will have finished",
            C1,
            "future_perfect",
        ),
        question(
            "g_c_3",
            T::GrammarConditionals,
            G::Conditionals,
            "If she had left earlier, she ______ the train.",
            &["would catch", "will have caught", "would have caught", "had caught"],
            "would have caught",
            C1,
            "third_conditional",
        ),
        question(
            "g_t_11",
            T::GrammarTenses,
            G::ModalVerbs,
            "You ______ have told me earlier; now it is too late.",
            &["should", "must", "can", "will"],
            "should",
            C1,
            "modal_perfect",
        ),
        question(
            "g_p_5",
            T::GrammarPrepositions,
            G::Prepositions,
            "The work was carried out in accordance ______ the regulations.",
            &["to", "with", "of", "by"],
            "with",
            C1,
            "fixed_prepositional_phrases",
        ),
        question(
            "v_c_5",
            T::VocabularyComplexity,
            G::VocabularyUsage,
            "Her argument was so ______ that nobody could find a flaw in it.",
            &["cogent", "tenuous", "verbose", "spurious"],
            "cogent",
            C1,
            "advanced_adjectives",
        ),
        question(
            "v_a_5",
            T::VocabularyAppropriateness,
            G::VocabularyUsage,
            "In an academic essay, 'this shows' is better phrased as 'this ______'.",
            &["proves for sure", "demonstrates", "kinda shows", "tells us"],
            "demonstrates",
            C1,
            "academic_register",
        ),
        question(
            "v_l_3",
            T::VocabularyCollocations,
            G::VocabularyCollocations,
            "The lecturer asked the students to ______ close attention.",
            &["give", "make", "pay", "do"],
            "pay",
            C1,
            "verb_noun_collocations",
        ),
        // C2
        question(
            "g_t_12",
            T::GrammarTenses,
            G::PastPerfect,
            "Scarcely ______ down when the phone rang.",
            &["I sat", "had I sat", "I had sat", "did I sit"],
            "had I sat",
            C2,
            "inversion",
        ),
        question(
            "g_c_4",
            T::GrammarConditionals,
            G::Conditionals,
            "______ known about the delay, I would have taken a later flight.",
            &["If I knew", "Had I", "Should I have", "Were I"],
            "Had I",
            C2,
            "inverted_conditional",
        ),
        question(
            "g_a_4",
            T::GrammarArticles,
            G::Articles,
            "______ rich are not always happier than ______ poor.",
            &["A / a", "The / the", "- / -", "The / -"],
            "The / the",
            C2,
            "articles_with_adjectives",
        ),
        question(
            "g_p_6",
            T::GrammarPrepositions,
            G::Prepositions,
            "Refusing to answer was tantamount ______ an admission of guilt.",
            &["with", "for", "to", "of"],
            "to",
            C2,
            "dependent_prepositions",
        ),
        question(
            "v_c_6",
            T::VocabularyComplexity,
            G::VocabularyUsage,
            "The minister's ______ remarks only made the scandal worse.",
            &["injudicious", "judicious", "judicial", "prejudicial"],
            "injudicious",
            C2,
            "advanced_adjectives",
        ),
        question(
            "v_a_6",
            T::VocabularyAppropriateness,
            G::VocabularyUsage,
            "In a formal complaint, 'your service is rubbish' is better put as 'your service ______'.",
            &["sucks", "fell short of expectations", "is well bad", "is garbage"],
            "fell short of expectations",
            C2,
            "formal_register",
        ),
    ]
}
