use std::sync::Arc;

use crate::element::DType;
use crate::error::ResolveError;

/// Kernel behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GemmFlags {
    /// `A` is stored transposed (k rows by m columns).
    pub trans_a: bool,
    /// `B` is stored transposed (n rows by k columns).
    pub trans_b: bool,
    /// Accumulate into `C` instead of overwriting it.
    pub accumulate: bool,
}

/// Advisory prefetch strategy baked into a descriptor. Kernels resolved
/// without prefetch support ignore the extra pointers entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Prefetch {
    #[default]
    None,
    /// Prefetch the next `A` operand.
    Al2,
    /// Prefetch the next `B` operand.
    Bl2,
    /// Prefetch the next `A` and `B` operands.
    Al2Bl2,
    /// Prefetch all three next operands.
    Al2Bl2Cl2,
}

/// Fully specifies a dense GEMM problem: `C = A * B (+ C)` with column-major
/// operands. Immutable once built; the logical cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GemmDesc {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub lda: usize,
    pub ldb: usize,
    pub ldc: usize,
    pub types: (DType, DType),
    pub flags: GemmFlags,
    pub prefetch: Prefetch,
}

impl GemmDesc {
    fn packed(m: usize, n: usize, k: usize, types: (DType, DType)) -> Self {
        Self {
            m,
            n,
            k,
            lda: m,
            ldb: k,
            ldc: m,
            types,
            flags: GemmFlags::default(),
            prefetch: Prefetch::default(),
        }
    }

    /// A packed `f32` problem; adjust leading dimensions and flags with the
    /// builder methods.
    pub fn f32(m: usize, n: usize, k: usize) -> Self {
        Self::packed(m, n, k, (DType::F32, DType::F32))
    }

    /// A packed `f64` problem.
    pub fn f64(m: usize, n: usize, k: usize) -> Self {
        Self::packed(m, n, k, (DType::F64, DType::F64))
    }

    /// A packed `bf16` input / `f32` output problem.
    pub fn bf16(m: usize, n: usize, k: usize) -> Self {
        Self::packed(m, n, k, (DType::Bf16, DType::F32))
    }

    pub fn with_leading(mut self, lda: usize, ldb: usize, ldc: usize) -> Self {
        self.lda = lda;
        self.ldb = ldb;
        self.ldc = ldc;
        self
    }

    pub fn with_flags(mut self, flags: GemmFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_prefetch(mut self, prefetch: Prefetch) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// Rows of the stored `A` matrix.
    pub(crate) fn stored_rows_a(&self) -> usize {
        if self.flags.trans_a {
            self.k
        } else {
            self.m
        }
    }

    /// Columns of the stored `A` matrix.
    pub(crate) fn stored_cols_a(&self) -> usize {
        if self.flags.trans_a {
            self.m
        } else {
            self.k
        }
    }

    pub(crate) fn stored_rows_b(&self) -> usize {
        if self.flags.trans_b {
            self.n
        } else {
            self.k
        }
    }

    pub(crate) fn stored_cols_b(&self) -> usize {
        if self.flags.trans_b {
            self.k
        } else {
            self.n
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ResolveError> {
        if self.m == 0 || self.n == 0 || self.k == 0 {
            return Err(ResolveError::InvalidDescriptor(
                "matrix dimensions must be positive",
            ));
        }
        if self.lda < self.stored_rows_a() {
            return Err(ResolveError::InvalidDescriptor(
                "lda smaller than the stored rows of A",
            ));
        }
        if self.ldb < self.stored_rows_b() {
            return Err(ResolveError::InvalidDescriptor(
                "ldb smaller than the stored rows of B",
            ));
        }
        if self.ldc < self.m {
            return Err(ResolveError::InvalidDescriptor("ldc smaller than m"));
        }
        Ok(())
    }

    /// Eligible for a fixed-shape specialization: packed operands, no
    /// transposition.
    pub(crate) fn is_small_candidate(&self) -> bool {
        !self.flags.trans_a
            && !self.flags.trans_b
            && self.lda == self.m
            && self.ldb == self.k
            && self.ldc == self.m
    }
}

/// A sparse-times-dense problem: `C = A * B (+ C)` where `B` is a `k` by
/// `cols` compressed-sparse-column matrix whose pattern is fixed at
/// generation time, and `A` (`rows` by `k`) and `C` (`rows` by `cols`) are
/// dense column-major. Values are supplied per call; only the pattern is
/// part of the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SparseDesc {
    pub rows: usize,
    pub k: usize,
    pub cols: usize,
    pub lda: usize,
    pub ldc: usize,
    pub accumulate: bool,
    pub colptr: Arc<[u32]>,
    pub rowidx: Arc<[u32]>,
}

impl SparseDesc {
    pub fn new(
        rows: usize,
        k: usize,
        cols: usize,
        colptr: impl Into<Arc<[u32]>>,
        rowidx: impl Into<Arc<[u32]>>,
    ) -> Self {
        Self {
            rows,
            k,
            cols,
            lda: rows,
            ldc: rows,
            accumulate: false,
            colptr: colptr.into(),
            rowidx: rowidx.into(),
        }
    }

    pub fn with_leading(mut self, lda: usize, ldc: usize) -> Self {
        self.lda = lda;
        self.ldc = ldc;
        self
    }

    pub fn with_accumulate(mut self, accumulate: bool) -> Self {
        self.accumulate = accumulate;
        self
    }

    pub fn nnz(&self) -> usize {
        self.rowidx.len()
    }

    pub(crate) fn validate(&self) -> Result<(), ResolveError> {
        if self.rows == 0 || self.k == 0 || self.cols == 0 {
            return Err(ResolveError::InvalidDescriptor(
                "matrix dimensions must be positive",
            ));
        }
        if self.lda < self.rows || self.ldc < self.rows {
            return Err(ResolveError::InvalidDescriptor(
                "leading dimension smaller than the dense row count",
            ));
        }
        if self.colptr.len() != self.cols + 1 {
            return Err(ResolveError::InvalidDescriptor(
                "colptr length must be cols + 1",
            ));
        }
        if self.colptr[0] != 0 {
            return Err(ResolveError::InvalidDescriptor("colptr must start at 0"));
        }
        if self.colptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(ResolveError::InvalidDescriptor(
                "colptr must be monotonically non-decreasing",
            ));
        }
        if self.colptr[self.cols] as usize != self.rowidx.len() {
            return Err(ResolveError::InvalidDescriptor(
                "colptr end must equal the nonzero count",
            ));
        }
        if self.rowidx.iter().any(|&r| r as usize >= self.k) {
            return Err(ResolveError::InvalidDescriptor(
                "row index outside the sparse matrix",
            ));
        }
        Ok(())
    }
}

/// Out-of-place matrix copy of an `m` by `n` column-major block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CopyDesc {
    pub m: usize,
    pub n: usize,
    pub ldi: usize,
    pub ldo: usize,
    /// Prefetch the next input column while copying the current one.
    pub prefetch: bool,
}

impl CopyDesc {
    pub fn new(m: usize, n: usize) -> Self {
        Self {
            m,
            n,
            ldi: m,
            ldo: m,
            prefetch: false,
        }
    }

    pub fn with_leading(mut self, ldi: usize, ldo: usize) -> Self {
        self.ldi = ldi;
        self.ldo = ldo;
        self
    }

    pub fn with_prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ResolveError> {
        if self.m == 0 || self.n == 0 {
            return Err(ResolveError::InvalidDescriptor(
                "matrix dimensions must be positive",
            ));
        }
        if self.ldi < self.m || self.ldo < self.m {
            return Err(ResolveError::InvalidDescriptor(
                "leading dimension smaller than m",
            ));
        }
        Ok(())
    }
}

/// Out-of-place transpose: the `m` by `n` input becomes an `n` by `m`
/// output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransDesc {
    pub m: usize,
    pub n: usize,
    pub ldi: usize,
    pub ldo: usize,
}

impl TransDesc {
    pub fn new(m: usize, n: usize) -> Self {
        Self {
            m,
            n,
            ldi: m,
            ldo: n,
        }
    }

    pub fn with_leading(mut self, ldi: usize, ldo: usize) -> Self {
        self.ldi = ldi;
        self.ldo = ldo;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ResolveError> {
        if self.m == 0 || self.n == 0 {
            return Err(ResolveError::InvalidDescriptor(
                "matrix dimensions must be positive",
            ));
        }
        if self.ldi < self.m {
            return Err(ResolveError::InvalidDescriptor(
                "input leading dimension smaller than m",
            ));
        }
        if self.ldo < self.n {
            return Err(ResolveError::InvalidDescriptor(
                "output leading dimension smaller than n",
            ));
        }
        Ok(())
    }
}
