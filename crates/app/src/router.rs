const WEATHER_TRIGGERS: [&str; 6] = ["weather", "temperature", "rain", "sunny", "forecast", "humidity"];
const DEFAULT_CITY: &str = "London";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Weather,
    Document,
}

pub fn decide_action(input: &str) -> Action {
    let lowered = input.to_lowercase();
    if WEATHER_TRIGGERS.iter().any(|trigger| lowered.contains(trigger)) {
        Action::Weather
    } else {
        Action::Document
    }
}

/// Word following the first " in ", else the last word of the input.
pub fn extract_city(input: &str) -> String {
    let trim = |word: &str| word.trim_matches(|ch: char| matches!(ch, ',' | '.' | '?')).to_string();

    let lowered = input.to_lowercase();
    if let Some((_, after)) = lowered.split_once(" in ") {
        if let Some(word) = after.split_whitespace().next() {
            return trim(word);
        }
    }

    input
        .split_whitespace()
        .last()
        .map(trim)
        .unwrap_or_else(|| DEFAULT_CITY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_words_route_to_weather() {
        assert_eq!(decide_action("What's the weather in Paris?"), Action::Weather);
        assert_eq!(decide_action("Will it RAIN tomorrow"), Action::Weather);
        assert_eq!(decide_action("humidity levels in Delhi"), Action::Weather);
    }

    #[test]
    fn everything_else_routes_to_documents() {
        assert_eq!(decide_action("Tell me about biodiversity in India"), Action::Document);
        assert_eq!(decide_action(""), Action::Document);
    }

    #[test]
    fn city_follows_in() {
        assert_eq!(extract_city("What is the weather in Paris?"), "paris");
        assert_eq!(extract_city("temperature in new york today"), "new");
    }

    #[test]
    fn city_falls_back_to_last_word_then_default() {
        assert_eq!(extract_city("weather Berlin?"), "Berlin");
        assert_eq!(extract_city("weather in "), "in");
        assert_eq!(extract_city("   "), "London");
    }
}
