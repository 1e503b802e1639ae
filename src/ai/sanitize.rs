use lazy_static::lazy_static;
use regex::Regex;

const TAGGED_FENCE: &str = "```json";
const FENCE: &str = "```";

lazy_static! {
    static ref UNIT_QUOTE: Regex = Regex::new(r#"([0-9])"([A-Za-z])"#).unwrap();
}

/// Trim a raw model response down to the substring most likely to be JSON.
///
/// Strips one leading "```json" (or bare "```") fence and one trailing fence,
/// then slices to the outermost object or array, whichever opens first.
/// Text with no usable brackets comes back trimmed but otherwise untouched;
/// whether the result parses is left to the caller.
pub fn sanitize(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix(TAGGED_FENCE) {
        text = rest;
    } else if let Some(rest) = text.strip_prefix(FENCE) {
        text = rest;
    }

    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }

    let text = text.trim();

    let first_brace = text.find('{');
    let first_bracket = text.find('[');

    let bounds = match (first_brace, first_bracket) {
        (Some(brace), bracket) if bracket.is_none_or(|b| brace < b) => {
            Some((brace, text.rfind('}')))
        }
        (_, Some(bracket)) => Some((bracket, text.rfind(']'))),
        _ => None,
    };

    if let Some((start, Some(end))) = bounds
        && end > start
    {
        return text[start..=end].trim().to_string();
    }

    text.to_string()
}

/// Escape quotes that sit between a digit and a letter, e.g. `27"F` -> `27\"F`.
///
/// Models occasionally write unit notations inside JSON strings without
/// escaping the quote. This only targets that digit/quote/letter shape; it is
/// not a general JSON repair.
pub fn repair_unescaped_unit_quotes(text: &str) -> String {
    UNIT_QUOTE.replace_all(text, r#"$1\"$2"#).into_owned()
}
