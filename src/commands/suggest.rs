use crate::config::Config;
use crate::error::Result;
use crate::suggest::{SuggestClient, Suggester};

/// Autocomplete suggestions for a topic prefix
pub async fn cmd_suggest(config: &Config, prefix: &str) -> Result<Vec<String>> {
    let client = SuggestClient::new(&config.suggest)?;
    Ok(client.suggest(prefix).await)
}

pub fn print_suggestions(prefix: &str, suggestions: &[String]) {
    if suggestions.is_empty() {
        println!("No suggestions for '{}'", prefix);
        return;
    }

    for suggestion in suggestions {
        println!("{}", suggestion);
    }
}
