//! The `lexiscore init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("lexiscore.toml").exists() {
        println!("lexiscore.toml already exists, skipping.");
    } else {
        std::fs::write("lexiscore.toml", SAMPLE_CONFIG)?;
        println!("Created lexiscore.toml");
    }

    std::fs::create_dir_all("question-banks")?;
    let bank_path = Path::new("question-banks/example.toml");
    if bank_path.exists() {
        println!("question-banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(bank_path, EXAMPLE_BANK)?;
        println!("Created question-banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Point lexiscore.toml at your annotation service and LanguageTool server");
    println!("  2. Run: lexiscore validate-bank --bank question-banks/example.toml");
    println!("  3. Run: lexiscore analyze --text essay.txt --output analysis.json");
    println!("  4. Run: lexiscore followup --result analysis.json --output questions.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# lexiscore configuration

timeout_secs = 10
question_banks = ["question-banks"]
# lexicon_path = "data/lexicon.json"
# frequency_path = "data/zipf.tsv"
# followup_seed = 42

[annotator]
type = "http"
base_url = "http://localhost:8090"

[rule_checker]
type = "languagetool"
base_url = "${LANGUAGETOOL_URL}"
language = "en-US"

[analysis]
min_words = 90
max_words = 400
highlight_radius = 100
parallelism = 4
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Bank"
description = "A few extra questions to get started"

[[questions]]
id = "ex_travel_1"
type = "grammar_prepositions"
aspect = "prepositions"
question = "Our train arrives ______ Paris at six."
options = ["in", "at", "on", "to"]
answer = "in"
level = "A2"
topic = "prepositions_of_place"

[[questions]]
id = "ex_travel_2"
type = "grammar_tenses"
aspect = "present_perfect"
question = "I ______ never been to Japan."
options = ["have", "has", "had", "am"]
answer = "have"
level = "B1"
topic = "experiences"

[[questions]]
id = "ex_travel_3"
type = "vocabulary_collocations"
aspect = "vocabulary_collocations"
question = "Could you ______ me a favour and water the plants?"
options = ["make", "do", "give", "take"]
answer = "do"
level = "B1"
topic = "collocations_with_do"
"#;
