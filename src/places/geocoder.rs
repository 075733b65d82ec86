//! Geocoder — finds known place names inside free text.
//!
//! Matching works on alphanumeric tokens, so a name can never match inside a
//! larger token ("Camp 8" does not match "Camp 8E"). At each token position
//! the longest known name wins; matches are disjoint and reported in order of
//! appearance with their byte span in the original text.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::index::{tokens_of, PlaceGroup, PlaceIndex};
use crate::error::QueryError;
use crate::spatial::Coordinate;

/// How a match relates to the route implied by the sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceRole {
    Origin,
    Destination,
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeMatch {
    pub name: String,
    pub normalized_name: String,
    pub lat: f64,
    pub lon: f64,
    /// Byte offsets into the input text.
    pub start: usize,
    pub end: usize,
    pub role: PlaceRole,
    /// Dataset entries averaged into this coordinate.
    pub entries: usize,
}

impl GeocodeMatch {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    fn from_group(group: &PlaceGroup, start: usize, end: usize) -> Self {
        Self {
            name: group.name.clone(),
            normalized_name: group.normalized_name.clone(),
            lat: group.coordinate.lat,
            lon: group.coordinate.lon,
            start,
            end,
            role: PlaceRole::Unspecified,
            entries: group.entries,
        }
    }
}

/// Query text with place names replaced by literal coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedQuery {
    pub original: String,
    pub rewritten: String,
    pub matches: Vec<GeocodeMatch>,
}

#[derive(Debug, Clone)]
struct Token {
    text: String,
    start: usize,
    end: usize,
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (i, c) in text.char_indices() {
        if c.is_alphanumeric() {
            match current.as_mut() {
                Some((_, buf)) => buf.extend(c.to_lowercase()),
                None => current = Some((i, c.to_lowercase().collect())),
            }
        } else if let Some((start, buf)) = current.take() {
            tokens.push(Token {
                text: buf,
                start,
                end: i,
            });
        }
    }
    if let Some((start, buf)) = current {
        tokens.push(Token {
            text: buf,
            start,
            end: text.len(),
        });
    }
    tokens
}

const ORIGIN_WORDS: &[&str] = &["from", "between"];
const DESTINATION_WORDS: &[&str] = &["to", "towards", "toward", "into", "reach"];

#[derive(Debug, Clone)]
pub struct Geocoder {
    index: Arc<PlaceIndex>,
}

impl Geocoder {
    pub fn new(index: Arc<PlaceIndex>) -> Self {
        Self { index }
    }

    /// Every known place name in `text`, in order of appearance, role-tagged.
    pub fn find_all(&self, text: &str) -> Vec<GeocodeMatch> {
        let tokens = tokenize(text);
        // (first token index, match)
        let mut found: Vec<(usize, GeocodeMatch)> = Vec::new();

        let mut i = 0;
        while i < tokens.len() {
            let hit = self.index.candidates(&tokens[i].text).find(|group| {
                let n = group.tokens.len();
                i + n <= tokens.len()
                    && group
                        .tokens
                        .iter()
                        .zip(&tokens[i..i + n])
                        .all(|(want, got)| *want == got.text)
            });

            match hit {
                Some(group) => {
                    let n = group.tokens.len();
                    let m = GeocodeMatch::from_group(group, tokens[i].start, tokens[i + n - 1].end);
                    found.push((i, m));
                    i += n;
                }
                None => i += 1,
            }
        }

        assign_roles(&tokens, &mut found);
        debug!(matches = found.len(), "geocoded text");
        found.into_iter().map(|(_, m)| m).collect()
    }

    /// Coordinate of the first place named in `text`.
    pub fn resolve(&self, text: &str) -> Result<Coordinate, QueryError> {
        self.find_all(text)
            .first()
            .map(GeocodeMatch::coordinate)
            .ok_or_else(|| QueryError::NotFound(text.to_string()))
    }

    /// Resolve an explicit place name.
    ///
    /// Tries, in order: exact normalized name, names found inside the input,
    /// then known names containing the input as whole words.
    pub fn lookup(&self, place_name: &str, max_results: usize) -> Result<Vec<GeocodeMatch>, QueryError> {
        let max_results = max_results.max(1);
        let span_end = place_name.len();

        if let Some(group) = self.index.get(place_name) {
            return Ok(vec![GeocodeMatch::from_group(group, 0, span_end)]);
        }

        let mut in_text = self.find_all(place_name);
        if !in_text.is_empty() {
            in_text.truncate(max_results);
            return Ok(in_text);
        }

        let wanted = tokens_of(place_name);
        if wanted.is_empty() {
            return Err(QueryError::NotFound(place_name.to_string()));
        }

        let mut containing: Vec<&PlaceGroup> = self
            .index
            .groups()
            .iter()
            .filter(|g| g.tokens.windows(wanted.len()).any(|w| w == wanted.as_slice()))
            .collect();
        containing.sort_by(|a, b| {
            a.tokens
                .len()
                .cmp(&b.tokens.len())
                .then_with(|| a.normalized_name.cmp(&b.normalized_name))
        });

        if containing.is_empty() {
            return Err(QueryError::NotFound(place_name.to_string()));
        }

        Ok(containing
            .into_iter()
            .take(max_results)
            .map(|g| GeocodeMatch::from_group(g, 0, span_end))
            .collect())
    }

    /// Replace each place span with `(lat .., lon ..)` for the model prompt.
    pub fn annotate(&self, text: &str) -> AnnotatedQuery {
        let matches = self.find_all(text);
        let mut rewritten = text.to_string();
        for m in matches.iter().rev() {
            rewritten.replace_range(
                m.start..m.end,
                &format!("(lat {:.6}, lon {:.6})", m.lat, m.lon),
            );
        }
        AnnotatedQuery {
            original: text.to_string(),
            rewritten,
            matches,
        }
    }
}

/// Tag origin/destination from the connective word before each match.
fn assign_roles(tokens: &[Token], found: &mut [(usize, GeocodeMatch)]) {
    for k in 0..found.len() {
        let first_token = found[k].0;
        let Some(prev) = first_token.checked_sub(1).map(|p| tokens[p].text.as_str()) else {
            continue;
        };

        if ORIGIN_WORDS.contains(&prev) {
            found[k].1.role = PlaceRole::Origin;
            if prev == "between" {
                // "between X and Y"
                if let Some(next) = found.get(k + 1) {
                    let (next_first, _) = next;
                    let x_end = found[k].0 + found[k].1.normalized_name.split(' ').count();
                    if *next_first == x_end + 1 && tokens[x_end].text == "and" {
                        found[k + 1].1.role = PlaceRole::Destination;
                    }
                }
            }
        } else if DESTINATION_WORDS.contains(&prev) && found[k].1.role == PlaceRole::Unspecified {
            found[k].1.role = PlaceRole::Destination;
        }
    }

    if let [(_, a), (_, b)] = found {
        match (a.role, b.role) {
            (PlaceRole::Unspecified, PlaceRole::Unspecified) => {
                a.role = PlaceRole::Origin;
                b.role = PlaceRole::Destination;
            }
            (PlaceRole::Origin, PlaceRole::Unspecified) => b.role = PlaceRole::Destination,
            (PlaceRole::Unspecified, PlaceRole::Origin) => a.role = PlaceRole::Destination,
            (PlaceRole::Destination, PlaceRole::Unspecified) => b.role = PlaceRole::Origin,
            (PlaceRole::Unspecified, PlaceRole::Destination) => a.role = PlaceRole::Origin,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::places::PlaceEntry;

    fn geocoder() -> Geocoder {
        Geocoder::new(Arc::new(PlaceIndex::new(vec![
            PlaceEntry::new("Camp 8", 21.10, 92.10),
            PlaceEntry::new("Camp 8E", 21.20, 92.20),
            PlaceEntry::new("Kutupalong Market", 21.30, 92.30),
            PlaceEntry::new("Balukhali", 21.40, 92.40),
            PlaceEntry::new("Old San Juan", 18.46, -66.11),
        ])))
    }

    #[test]
    fn test_longest_name_wins() {
        let g = geocoder();
        let c = g.resolve("Camp 8E").unwrap();
        assert_eq!(c, Coordinate::new(21.20, 92.20));

        let c = g.resolve("meet at camp 8 tonight").unwrap();
        assert_eq!(c, Coordinate::new(21.10, 92.10));
    }

    #[test]
    fn test_word_boundaries() {
        let g = geocoder();
        // "Camp 8EX" is neither Camp 8 nor Camp 8E
        assert!(g.find_all("Camp 8EX").is_empty());
        assert!(g.find_all("Balukhaliland").is_empty());
        assert_eq!(g.find_all("Balukhali.").len(), 1);
    }

    #[test]
    fn test_spans_and_order() {
        let g = geocoder();
        let text = "Pharmacies near Kutupalong Market or Balukhali?";
        let matches = g.find_all(text);
        assert_eq!(matches.len(), 2);
        assert_eq!(&text[matches[0].start..matches[0].end], "Kutupalong Market");
        assert_eq!(&text[matches[1].start..matches[1].end], "Balukhali");
    }

    #[test]
    fn test_roles_from_connectives() {
        let g = geocoder();
        let m = g.find_all("walk to Balukhali from Camp 8E");
        assert_eq!(m[0].name, "Balukhali");
        assert_eq!(m[0].role, PlaceRole::Destination);
        assert_eq!(m[1].name, "Camp 8E");
        assert_eq!(m[1].role, PlaceRole::Origin);

        let m = g.find_all("route between Camp 8 and Balukhali");
        assert_eq!(m[0].role, PlaceRole::Origin);
        assert_eq!(m[1].role, PlaceRole::Destination);
    }

    #[test]
    fn test_roles_positional_fallback() {
        let g = geocoder();
        let m = g.find_all("Camp 8E, Balukhali: how far?");
        assert_eq!(m[0].role, PlaceRole::Origin);
        assert_eq!(m[1].role, PlaceRole::Destination);

        let single = g.find_all("schools near Balukhali");
        assert_eq!(single[0].role, PlaceRole::Unspecified);
    }

    #[test]
    fn test_not_found_is_typed() {
        let g = geocoder();
        let err = g.resolve("somewhere unknown").unwrap_err();
        assert!(matches!(err, QueryError::NotFound(_)));
    }

    #[test]
    fn test_lookup_strategies() {
        let g = geocoder();
        let exact = g.lookup("old san juan", 5).unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].name, "Old San Juan");

        let contained = g.lookup("San Juan", 5).unwrap();
        assert_eq!(contained[0].name, "Old San Juan");

        let partial = g.lookup("Camp", 5).unwrap();
        let names: Vec<&str> = partial.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Camp 8", "Camp 8E"]);

        assert!(g.lookup("Mandalay", 5).is_err());
    }

    #[test]
    fn test_annotate_rewrites_spans() {
        let g = geocoder();
        let a = g.annotate("hospitals near Camp 8E please");
        assert_eq!(a.matches.len(), 1);
        assert_eq!(a.rewritten, "hospitals near (lat 21.200000, lon 92.200000) please");
    }
}
