use std::collections::HashMap;

use crate::index::Neighbor;

/// 去重时默认多取的近邻数量
pub const DEFAULT_OVER_FETCH: usize = 50;

/// 计算实际需要搜索的近邻数量
///
/// 同一篇文章可能有多张图片命中，所以要多取一些近邻才能凑够 `num_results` 篇不同的文章。
/// 如果某篇文章的图片数量超过 `over_fetch`，结果可能少于 `num_results`。
pub fn search_k(ntotal: usize, over_fetch: usize, num_results: usize) -> usize {
    over_fetch.max(num_results).min(ntotal)
}

/// 将 k-NN 结果按文章去重，每篇文章保留最小距离，按距离升序返回前 `num_results` 篇
///
/// 距离相同时，先出现的文章排在前面。
pub fn rank_articles(
    neighbors: &[Neighbor],
    labels: &[String],
    num_results: usize,
) -> Vec<(String, f32)> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut best: Vec<(&str, f32)> = vec![];

    for neighbor in neighbors {
        let Some(label) = labels.get(neighbor.position).map(String::as_str) else {
            continue;
        };
        match seen.get(label) {
            Some(&i) => {
                if neighbor.distance < best[i].1 {
                    best[i].1 = neighbor.distance;
                }
            }
            None => {
                seen.insert(label, best.len());
                best.push((label, neighbor.distance));
            }
        }
    }

    // sort_by 是稳定排序，距离相同时保持首次出现的顺序
    best.sort_by(|a, b| a.1.total_cmp(&b.1));
    best.into_iter().take(num_results).map(|(label, d)| (label.to_owned(), d)).collect()
}

/// 将一组距离归一化为 `[0, 1]` 的相似度，最小距离为 1，最大距离为 0
///
/// 所有距离相同时相似度都为 1。只用于展示，不参与排序。
pub fn similarity_scores(distances: &[f32]) -> Vec<f32> {
    let min = distances.iter().copied().fold(f32::INFINITY, f32::min);
    let max = distances.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max == min {
        return vec![1.; distances.len()];
    }
    distances.iter().map(|d| 1. - (d - min) / (max - min)).collect()
}
