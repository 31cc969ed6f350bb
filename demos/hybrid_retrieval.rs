//! Example: comparing dense-only, keyword-heavy, and balanced fusion weights
//! against the same corpus and query.
//!
//! **Why compare?** The right fusion weight is corpus- and query-dependent:
//! a catalog full of product SKUs and error codes benefits from leaning on
//! the keyword signal, while a support-ticket corpus full of paraphrased
//! questions benefits from leaning on the semantic signal. Running the same
//! query through a few configurations makes that trade-off visible.

use hybrid_retrieve::{Document, HashingEmbedder, HybridRetriever, RetrieverConfig};

fn build_retriever(semantic_weight: f32, keyword_weight: f32) -> HybridRetriever<HashingEmbedder> {
    let config = RetrieverConfig {
        semantic_weight,
        keyword_weight,
        ..RetrieverConfig::default()
    };
    HybridRetriever::new(HashingEmbedder::new(128), config).expect("weights are valid")
}

fn documents() -> Vec<Document> {
    vec![
        Document::new("sku-a100", "SKU A100 replacement cartridge compatible with printer model X42"),
        Document::new("sku-b200", "SKU B200 high yield cartridge for the X42 and X45 printer lines"),
        Document::new("ink-guide", "How to know when your printer cartridge needs replacing"),
    ]
}

fn run(label: &str, retriever: &HybridRetriever<HashingEmbedder>, query: &str) {
    let response = retriever.retrieve(query, Some(3)).unwrap();
    println!("--- {label} ---");
    for result in &response.results {
        println!(
            "  {:>10} combined={:.3} semantic={:.3} keyword={:?}",
            result.id, result.scores.combined, result.scores.semantic, result.scores.keyword
        );
    }
}

fn main() {
    tracing_subscriber::fmt::try_init().ok();

    let query = "SKU A100 cartridge";

    let keyword_heavy = build_retriever(0.2, 0.8);
    keyword_heavy.index_documents(&documents()).unwrap();
    run("keyword-heavy (0.2 / 0.8)", &keyword_heavy, query);

    let balanced = build_retriever(0.6, 0.4);
    balanced.index_documents(&documents()).unwrap();
    run("balanced (0.6 / 0.4)", &balanced, query);

    let semantic_heavy = build_retriever(0.9, 0.1);
    semantic_heavy.index_documents(&documents()).unwrap();
    run("semantic-heavy (0.9 / 0.1)", &semantic_heavy, query);
}
