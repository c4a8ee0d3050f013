use std::cmp::Ordering;

use rayon::prelude::*;

use crate::error::{Error, Result};

/// 一张图片的特征向量
pub type Embedding = Vec<f32>;

/// 一次 k-NN 搜索命中的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// 向量在索引中的位置，即插入顺序
    pub position: usize,
    /// 平方 L2 距离
    pub distance: f32,
}

/// 暴力搜索的 L2 索引
///
/// 所有向量按插入顺序连续存放在一块内存中，维数由第一次插入的向量决定。
/// 数据集规模在几千张图片以内，精确结果比查询延迟更重要，所以这里不做任何近似。
#[derive(Debug, Clone, Default)]
pub struct FlatL2Index {
    dimensions: Option<usize>,
    ntotal: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// 索引维数，尚未插入任何向量时为 None
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// 索引中的向量数量
    pub fn size(&self) -> usize {
        self.ntotal
    }

    pub fn is_empty(&self) -> bool {
        self.ntotal == 0
    }

    /// 获取指定位置的向量
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let d = self.dimensions?;
        if position >= self.ntotal {
            return None;
        }
        Some(&self.data[position * d..(position + 1) * d])
    }

    /// 按顺序追加一组向量
    ///
    /// 只要有一个向量维数不一致，整组都不会被添加。
    pub fn add<V: AsRef<[f32]>>(&mut self, vectors: &[V]) -> Result<()> {
        let Some(first) = vectors.first() else {
            return Ok(());
        };
        let d = self.dimensions.unwrap_or(first.as_ref().len());
        if let Some(v) = vectors.iter().find(|v| v.as_ref().len() != d) {
            return Err(Error::DimensionMismatch { expected: d, actual: v.as_ref().len() });
        }

        self.data.reserve(vectors.len() * d);
        for v in vectors {
            self.data.extend_from_slice(v.as_ref());
        }
        self.dimensions = Some(d);
        self.ntotal += vectors.len();
        Ok(())
    }

    /// 搜索距离 query 最近的 k 个向量，按距离升序返回
    ///
    /// 返回数量为 `min(k, size)`，距离相同时插入顺序靠前的优先。
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let Some(d) = self.dimensions else {
            return Ok(vec![]);
        };
        if query.len() != d {
            return Err(Error::DimensionMismatch { expected: d, actual: query.len() });
        }
        let k = k.min(self.ntotal);
        if k == 0 {
            return Ok(vec![]);
        }

        let mut neighbors: Vec<Neighbor> = if d == 0 {
            (0..self.ntotal).map(|position| Neighbor { position, distance: 0. }).collect()
        } else {
            self.data
                .par_chunks_exact(d)
                .enumerate()
                .map(|(position, v)| Neighbor { position, distance: l2_sqr(query, v) })
                .collect()
        };

        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, cmp_neighbor);
            neighbors.truncate(k);
        }
        neighbors.sort_unstable_by(cmp_neighbor);

        Ok(neighbors)
    }
}

#[inline(always)]
pub fn l2_sqr(va: &[f32], vb: &[f32]) -> f32 {
    va.iter().zip(vb).map(|(a, b)| (a - b) * (a - b)).sum()
}

fn cmp_neighbor(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position))
}
