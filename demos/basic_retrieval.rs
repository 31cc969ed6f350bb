//! Example: indexing a small document set and running a hybrid query.
//!
//! **Pipeline:**
//! 1. Construct a [`HybridRetriever`] with the default fusion weights.
//! 2. Index a handful of documents.
//! 3. Retrieve the top matches for a query and print their scores.

use hybrid_retrieve::{Document, HashingEmbedder, HybridRetriever, RetrieverConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::try_init().ok();

    let retriever = HybridRetriever::new(HashingEmbedder::new(128), RetrieverConfig::default())?;

    retriever.index_documents(&[
        Document::new("faq-refunds", "Refunds are available within 30 days of purchase."),
        Document::new("faq-pricing", "Enterprise pricing includes volume tiers and annual contracts."),
        Document::new("faq-support", "Support is available 24/7 via chat and email for all paid plans."),
    ])?;

    let response = retriever.retrieve("how long do I have to request a refund", Some(3))?;

    println!("=== Query: {} ===", response.query);
    for result in &response.results {
        println!(
            "{:>16} | combined={:.3} semantic={:.3} keyword={:?} | {}",
            result.id, result.scores.combined, result.scores.semantic, result.scores.keyword, result.content
        );
    }

    Ok(())
}
