//! Reranker hook (spec §4.G step 6). The daemon has no bundled
//! cross-encoder; this trait is the seam a real one plugs into. With
//! no reranker configured, the pipeline treats it as an identity
//! transform rather than an error.

use crate::types::Candidate;

pub trait Reranker: Send + Sync {
    /// Return the new rank order of `candidates` as indices into that
    /// slice, best first. Returning `Err` leaves the caller's original
    /// order untouched (spec: "on timeout/failure, keep original order").
    fn rerank(&self, query: &str, candidates: &[Candidate]) -> Result<Vec<usize>, String>;
}

/// Reorder the top `top_n` candidates per the reranker's output and
/// replace their scores with rank-derived values `1 - i/N` on success;
/// leave everything untouched on failure or a malformed response.
pub fn apply_reranker(reranker: &dyn Reranker, query: &str, candidates: &mut Vec<Candidate>, top_n: usize) {
    let n = candidates.len().min(top_n);
    if n == 0 {
        return;
    }
    let head = candidates[..n].to_vec();
    let order = match reranker.rerank(query, &head) {
        Ok(order) if order.len() == n && {
            let mut sorted = order.clone();
            sorted.sort_unstable();
            sorted == (0..n).collect::<Vec<_>>()
        } =>
        {
            order
        }
        _ => {
            tracing::warn!("reranker failed or returned a malformed order, keeping original order");
            return;
        }
    };

    for (rank, &idx) in order.iter().enumerate() {
        let mut reranked = head[idx].clone();
        reranked.score = 1.0 - (rank as f64 / n as f64);
        candidates[rank] = reranked;
    }
}
