use corpus::keywords::{generate_keywords, stopwords, tf_idf_scores};
use corpus::vocab::aggregate;
use corpus::TermDictionary;
use std::collections::{HashMap, HashSet};

fn dict(pairs: &[(&str, u64)]) -> TermDictionary {
    let terms: HashMap<String, u64> = pairs.iter().map(|(t, c)| (t.to_string(), *c)).collect();
    TermDictionary { num_terms: terms.values().sum(), terms }
}

/// Three-document scenario: aggregation totals, IDF values, and the
/// keyword pick for the first document all follow from the counts.
#[test]
fn three_document_scenario() {
    let dicts = vec![
        dict(&[("a", 3), ("b", 1)]),
        dict(&[("a", 1), ("c", 2)]),
        dict(&[("a", 2)]),
    ];

    let (inverse, vocab) = aggregate(&dicts);
    assert_eq!(inverse.num_docs, 3);
    assert_eq!(inverse.doc_frequency["a"], 3);
    assert_eq!(inverse.doc_frequency["b"], 1);
    assert_eq!(inverse.doc_frequency["c"], 1);
    assert_eq!(vocab.terms["a"], 6);
    assert_eq!(vocab.terms["b"], 1);
    assert_eq!(vocab.terms["c"], 2);
    assert_eq!(vocab.num_terms, 3);

    let scores: HashMap<String, f64> = tf_idf_scores(&inverse, &dicts[0])
        .unwrap()
        .into_iter()
        .collect();
    // idf(a) = ln(3/3) = 0, so a scores zero everywhere.
    assert!(scores["a"].abs() < 1e-12);
    // tf(b) = 1/4, idf(b) = ln(3) -> score ~ 0.2747.
    assert!((scores["b"] - 0.25 * 3f64.ln()).abs() < 1e-12);

    let kws = generate_keywords(&inverse, &HashSet::new(), &dicts[0], 0.02, 5).unwrap();
    assert_eq!(kws, vec!["b".to_string()]);
}

/// A stopword set covering the whole vocabulary empties every keyword
/// list no matter how high the scores are.
#[test]
fn stopwords_suppress_all_keywords() {
    let dicts = vec![dict(&[("only", 4)]), dict(&[("other", 4)])];
    let (inverse, vocab) = aggregate(&dicts);
    let stop = stopwords(&vocab, 2);
    for d in &dicts {
        assert!(generate_keywords(&inverse, &stop, d, 0.0, 5)
            .unwrap()
            .is_empty());
    }
}
