use hybrid_retrieve::{Document, HybridRetriever, RetrieverConfig, HashingEmbedder};
use proptest::prelude::*;

fn corpus_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(
        (
            "[a-z]{4,8}",
            prop::collection::vec("[a-z]{3,7}", 3..10).prop_map(|words| words.join(" ")),
        ),
        1..12,
    )
    .prop_map(|pairs| {
        pairs
            .into_iter()
            .enumerate()
            .map(|(i, (prefix, content))| (format!("{prefix}-{i}"), content))
            .collect()
    })
}

proptest! {
    #[test]
    fn retrieve_never_returns_more_than_requested(
        corpus in corpus_strategy(),
        top_k in 1usize..15,
    ) {
        let retriever = HybridRetriever::new(HashingEmbedder::new(32), RetrieverConfig::default()).unwrap();
        let docs: Vec<Document> = corpus.iter().map(|(id, content)| Document::new(id.clone(), content.clone())).collect();
        retriever.index_documents(&docs).unwrap();

        let query = docs.first().map(|d| d.content.clone()).unwrap_or_else(|| "fallback query".to_string());
        let response = retriever.retrieve(&query, Some(top_k)).unwrap();

        prop_assert!(response.results.len() <= top_k);
        prop_assert!(response.results.len() <= docs.len());
    }

    #[test]
    fn every_result_id_came_from_the_indexed_corpus(
        corpus in corpus_strategy(),
    ) {
        let retriever = HybridRetriever::new(HashingEmbedder::new(32), RetrieverConfig::default()).unwrap();
        let docs: Vec<Document> = corpus.iter().map(|(id, content)| Document::new(id.clone(), content.clone())).collect();
        retriever.index_documents(&docs).unwrap();

        let known_ids: std::collections::HashSet<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        let response = retriever.retrieve("query terms here", Some(20)).unwrap();

        for result in &response.results {
            prop_assert!(known_ids.contains(result.id.as_str()));
        }
    }

    #[test]
    fn weight_normalization_always_sums_to_one(
        semantic in 0.01f32..100.0,
        keyword in 0.01f32..100.0,
    ) {
        let config = RetrieverConfig {
            semantic_weight: semantic,
            keyword_weight: keyword,
            ..RetrieverConfig::default()
        }
        .validated()
        .unwrap();

        prop_assert!((config.semantic_weight + config.keyword_weight - 1.0).abs() < 1e-4);
    }

    #[test]
    fn result_ids_within_a_response_are_unique(
        corpus in corpus_strategy(),
    ) {
        let retriever = HybridRetriever::new(HashingEmbedder::new(32), RetrieverConfig::default()).unwrap();
        let docs: Vec<Document> = corpus.iter().map(|(id, content)| Document::new(id.clone(), content.clone())).collect();
        retriever.index_documents(&docs).unwrap();

        let response = retriever.retrieve("query terms here", Some(20)).unwrap();
        let mut ids: Vec<&str> = response.results.iter().map(|r| r.id.as_str()).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(before, ids.len());
    }
}
