// crates/sd_foundation/src/tolerance.rs

//! 有限差分与精确梯度的比较容差
//!
//! 单侧差分的误差由两部分组成：
//!
//! ```text
//! |g_fd - g_ad| <= C_t · h · s  +  C_r · ε · s / h,   s = max(1, |g_ad|)
//! ```
//!
//! 第一项为 O(h) 截断误差，第二项为坐标相减带来的舍入误差。
//! 容差随步长 `h` 变化，不使用固定的 epsilon。

use serde::{Deserialize, Serialize};

/// FD/AD 比较容差
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FdTolerance {
    /// 截断误差系数 C_t
    pub truncation_factor: f64,
    /// 舍入误差系数 C_r
    pub roundoff_factor: f64,
}

impl Default for FdTolerance {
    fn default() -> Self {
        Self {
            truncation_factor: 10.0,
            roundoff_factor: 1.0e3,
        }
    }
}

impl FdTolerance {
    /// 创建容差
    pub fn new(truncation_factor: f64, roundoff_factor: f64) -> Self {
        Self {
            truncation_factor,
            roundoff_factor,
        }
    }

    /// 给定步长与参考梯度的允许偏差
    #[inline]
    pub fn bound(&self, step: f64, reference: f64) -> f64 {
        let h = step.abs();
        let scale = reference.abs().max(1.0);
        let roundoff = if h > 0.0 {
            self.roundoff_factor * f64::EPSILON * scale / h
        } else {
            f64::INFINITY
        };
        self.truncation_factor * h * scale + roundoff
    }

    /// 判断 FD 结果是否落在允许偏差内
    #[inline]
    pub fn accepts(&self, fd: f64, ad: f64, step: f64) -> bool {
        (fd - ad).abs() <= self.bound(step, ad)
    }
}
