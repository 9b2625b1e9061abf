//! Triplet validation
//!
//! Deduplicates accumulated triplets on `(subject, relation, object)`.

use std::collections::HashMap;

use lexgraph_core::GraphTriplet;

/// Keep one triplet per `(subject, relation, object)` key
///
/// A later triplet replaces the stored one only with strictly higher
/// confidence, so ties keep the first seen. Output follows the order in
/// which keys were first seen.
pub fn deduplicate_triplets(triplets: Vec<GraphTriplet>) -> Vec<GraphTriplet> {
    let mut slots: HashMap<(String, String, String), usize> = HashMap::new();
    let mut unique: Vec<GraphTriplet> = Vec::with_capacity(triplets.len());

    for triplet in triplets {
        let (subject, relation, object) = triplet.key();
        let key = (subject.to_string(), relation.to_string(), object.to_string());

        match slots.get(&key) {
            Some(&slot) => {
                if triplet.confidence > unique[slot].confidence {
                    unique[slot] = triplet;
                }
            }
            None => {
                slots.insert(key, unique.len());
                unique.push(triplet);
            }
        }
    }

    unique
}

/// Triplets whose relation label is outside the taxonomy
pub fn out_of_vocabulary(triplets: &[GraphTriplet]) -> Vec<&GraphTriplet> {
    triplets
        .iter()
        .filter(|t| t.relation_type().is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triplet(subject: &str, relation: &str, object: &str, confidence: f32) -> GraphTriplet {
        GraphTriplet::new(subject, relation, object, "제1조").with_confidence(confidence)
    }

    #[test]
    fn test_empty_input() {
        assert!(deduplicate_triplets(Vec::new()).is_empty());
    }

    #[test]
    fn test_higher_confidence_wins_in_either_order() {
        let low = triplet("a", "requires", "b", 0.8);
        let high = triplet("a", "requires", "b", 0.9);

        let forward = deduplicate_triplets(vec![low.clone(), high.clone()]);
        let backward = deduplicate_triplets(vec![high, low]);

        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].confidence, 0.9);
        assert_eq!(backward.len(), 1);
        assert_eq!(backward[0].confidence, 0.9);
    }

    #[test]
    fn test_ties_keep_first_seen() {
        let first = GraphTriplet::new("a", "defines", "b", "제1조").with_confidence(0.5);
        let second = GraphTriplet::new("a", "defines", "b", "제2조").with_confidence(0.5);

        let result = deduplicate_triplets(vec![first, second]);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].article_number, "제1조");
    }

    #[test]
    fn test_order_follows_first_insertion() {
        let result = deduplicate_triplets(vec![
            triplet("a", "r", "b", 0.5),
            triplet("c", "r", "d", 0.5),
            triplet("a", "r", "b", 0.7),
            triplet("e", "r", "f", 0.5),
        ]);

        let subjects: Vec<&str> = result.iter().map(|t| t.subject.as_str()).collect();
        assert_eq!(subjects, vec!["a", "c", "e"]);
        assert_eq!(result[0].confidence, 0.7);
    }

    #[test]
    fn test_key_is_full_triple() {
        let result = deduplicate_triplets(vec![
            triplet("a", "requires", "b", 1.0),
            triplet("a", "prohibits", "b", 1.0),
            triplet("a", "requires", "c", 1.0),
        ]);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_out_of_vocabulary() {
        let triplets = vec![
            triplet("a", "requires", "b", 1.0),
            triplet("a", "관련있음", "b", 1.0),
            triplet("a", "금지함", "b", 1.0),
        ];

        let unknown = out_of_vocabulary(&triplets);
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].relation, "관련있음");
    }
}
