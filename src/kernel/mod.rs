//! Kernel generation and caching. Entries are generated lazily on first
//! request for a (descriptor, tier) pair, are immutable afterwards, and
//! live for the rest of the process. Concurrent resolves of the same pair
//! serialize on the cache lock so at most one generation happens; already
//! resolved entries are shared `Arc`s that need no further
//! synchronization.

pub mod desc;
mod gemm;
mod sparse;
mod xcopy;

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, LazyLock, Mutex};

use half::bf16;

use crate::backend::Variant;
use crate::detect::{attribute, Attribution};
use crate::element::{DType, Element};
use crate::error::ResolveError;
use crate::shim::bf16::bf16_to_f32;
use crate::shim::prefetch_read;
use crate::tier::Tier;

use desc::{CopyDesc, GemmDesc, Prefetch, SparseDesc, TransDesc};
use gemm::{GemmFn, GemmOps};
use sparse::{SparseFn, SparseProgram};
use xcopy::{CopyFn, TransFn};

pub(crate) struct KernelCache<K, V> {
    map: Mutex<HashMap<K, Arc<V>>>,
}

impl<K: Eq + Hash, V> KernelCache<K, V> {
    fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached entry for `key` or generates it while holding
    /// the lock. On generation failure the cache is left unmodified, so a
    /// retry is safe.
    fn resolve_with(
        &self,
        key: K,
        generate: impl FnOnce() -> Result<V, ResolveError>,
    ) -> Result<Arc<V>, ResolveError> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| ResolveError::Generation("kernel cache lock poisoned"))?;
        if let Some(entry) = map.get(&key) {
            return Ok(entry.clone());
        }
        let entry = Arc::new(generate()?);
        map.insert(key, entry.clone());
        Ok(entry)
    }
}

fn panel_len(ld: usize, rows: usize, cols: usize) -> usize {
    ld * (cols - 1) + rows
}

struct GemmInner<E: Element> {
    desc: GemmDesc,
    tier: Tier,
    variant: Variant,
    specialized: bool,
    body: GemmFn<E>,
}

/// A resolved dense kernel: immutable, cheap to clone, safe to invoke
/// concurrently from any number of threads.
pub struct GemmKernel<E: Element> {
    inner: Arc<GemmInner<E>>,
}

impl<E: Element> Clone for GemmKernel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Element> GemmKernel<E> {
    pub fn descriptor(&self) -> &GemmDesc {
        &self.inner.desc
    }

    /// The tier this kernel effectively carries after attribution. Lower
    /// than the requested tier when the request was clamped.
    pub fn effective_tier(&self) -> Tier {
        self.inner.tier
    }

    pub fn variant(&self) -> Variant {
        self.inner.variant
    }

    /// True when a pre-generated fixed-shape kernel was selected instead
    /// of the generic blocked one.
    pub fn is_specialized(&self) -> bool {
        self.inner.specialized
    }

    /// # Safety
    ///
    /// The pointers must cover the panels the descriptor names: `A` is
    /// `lda` by its stored column count, `B` likewise, `C` is `ldc` by
    /// `n`, all column-major.
    #[inline]
    pub unsafe fn call(&self, a: *const E, b: *const E, c: *mut E) {
        (self.inner.body)(&self.inner.desc, a, b, c)
    }

    /// Like [`call`](Self::call), with advisory prefetch addresses for the
    /// next invocation's operands. Hints outside the descriptor's prefetch
    /// strategy are ignored.
    ///
    /// # Safety
    ///
    /// Same as [`call`](Self::call); the prefetch pointers may be wild.
    #[inline]
    pub unsafe fn call_prefetch(
        &self,
        a: *const E,
        b: *const E,
        c: *mut E,
        next_a: *const E,
        next_b: *const E,
        next_c: *const E,
    ) {
        match self.inner.desc.prefetch {
            Prefetch::None => {}
            Prefetch::Al2 => prefetch_read(next_a),
            Prefetch::Bl2 => prefetch_read(next_b),
            Prefetch::Al2Bl2 => {
                prefetch_read(next_a);
                prefetch_read(next_b);
            }
            Prefetch::Al2Bl2Cl2 => {
                prefetch_read(next_a);
                prefetch_read(next_b);
                prefetch_read(next_c);
            }
        }
        self.call(a, b, c)
    }

    /// Bounds-checked slice entry point.
    pub fn execute(&self, a: &[E], b: &[E], c: &mut [E]) -> Result<(), ResolveError> {
        let d = &self.inner.desc;
        if a.len() < panel_len(d.lda, d.stored_rows_a(), d.stored_cols_a())
            || b.len() < panel_len(d.ldb, d.stored_rows_b(), d.stored_cols_b())
            || c.len() < panel_len(d.ldc, d.m, d.n)
        {
            return Err(ResolveError::InvalidDescriptor(
                "operand slice shorter than the descriptor's panel",
            ));
        }
        unsafe { self.call(a.as_ptr(), b.as_ptr(), c.as_mut_ptr()) };
        Ok(())
    }
}

fn build_gemm<E: Element>(
    desc: &GemmDesc,
    att: Attribution,
    ops: &'static GemmOps<E>,
) -> GemmInner<E> {
    let (body, specialized) = if desc.flags.trans_a || desc.flags.trans_b {
        (gemm::gemm_any::<E> as GemmFn<E>, false)
    } else if desc.is_small_candidate() {
        match gemm::small_index(desc.m, desc.n, desc.k) {
            Some(index) => (ops.small[index], true),
            None => (ops.blocked, false),
        }
    } else {
        (ops.blocked, false)
    };
    GemmInner {
        desc: *desc,
        tier: att.effective,
        variant: att.variant,
        specialized,
        body,
    }
}

static GEMM_F32: LazyLock<KernelCache<(GemmDesc, Tier), GemmInner<f32>>> =
    LazyLock::new(KernelCache::new);
static GEMM_F64: LazyLock<KernelCache<(GemmDesc, Tier), GemmInner<f64>>> =
    LazyLock::new(KernelCache::new);

pub(crate) fn resolve_gemm_f32(
    desc: &GemmDesc,
    requested: Tier,
) -> Result<GemmKernel<f32>, ResolveError> {
    desc.validate()?;
    if desc.types != (DType::F32, DType::F32) {
        return Err(ResolveError::UnsupportedTypes(desc.types.0, desc.types.1));
    }
    let att = attribute(requested)?;
    let inner = GEMM_F32.resolve_with((*desc, att.effective), || {
        Ok(build_gemm(desc, att, gemm::ops_f32(att.variant)))
    })?;
    Ok(GemmKernel { inner })
}

pub(crate) fn resolve_gemm_f64(
    desc: &GemmDesc,
    requested: Tier,
) -> Result<GemmKernel<f64>, ResolveError> {
    desc.validate()?;
    if desc.types != (DType::F64, DType::F64) {
        return Err(ResolveError::UnsupportedTypes(desc.types.0, desc.types.1));
    }
    let att = attribute(requested)?;
    let inner = GEMM_F64.resolve_with((*desc, att.effective), || {
        Ok(build_gemm(desc, att, gemm::ops_f64(att.variant)))
    })?;
    Ok(GemmKernel { inner })
}

struct Bf16Inner {
    desc: GemmDesc,
    fdesc: GemmDesc,
    tier: Tier,
    variant: Variant,
    body: GemmFn<f32>,
}

/// A resolved `bf16`-input kernel. Operands are widened exactly into
/// packed `f32` panels per call and accumulation happens in `f32`.
#[derive(Clone)]
pub struct GemmBf16Kernel {
    inner: Arc<Bf16Inner>,
}

impl GemmBf16Kernel {
    pub fn descriptor(&self) -> &GemmDesc {
        &self.inner.desc
    }

    pub fn effective_tier(&self) -> Tier {
        self.inner.tier
    }

    pub fn variant(&self) -> Variant {
        self.inner.variant
    }

    /// # Safety
    ///
    /// Same panel requirements as [`GemmKernel::call`], with `A` and `B`
    /// holding `bf16` and `C` holding `f32`.
    pub unsafe fn call(&self, a: *const bf16, b: *const bf16, c: *mut f32) {
        let d = &self.inner.desc;
        let (ra, ca) = (d.stored_rows_a(), d.stored_cols_a());
        let (rb, cb) = (d.stored_rows_b(), d.stored_cols_b());
        let mut abuf = vec![0f32; ra * ca];
        for j in 0..ca {
            for i in 0..ra {
                abuf[i + j * ra] = bf16_to_f32(*a.add(i + j * d.lda));
            }
        }
        let mut bbuf = vec![0f32; rb * cb];
        for j in 0..cb {
            for i in 0..rb {
                bbuf[i + j * rb] = bf16_to_f32(*b.add(i + j * d.ldb));
            }
        }
        (self.inner.body)(&self.inner.fdesc, abuf.as_ptr(), bbuf.as_ptr(), c)
    }

    /// Bounds-checked slice entry point.
    pub fn execute(&self, a: &[bf16], b: &[bf16], c: &mut [f32]) -> Result<(), ResolveError> {
        let d = &self.inner.desc;
        if a.len() < panel_len(d.lda, d.stored_rows_a(), d.stored_cols_a())
            || b.len() < panel_len(d.ldb, d.stored_rows_b(), d.stored_cols_b())
            || c.len() < panel_len(d.ldc, d.m, d.n)
        {
            return Err(ResolveError::InvalidDescriptor(
                "operand slice shorter than the descriptor's panel",
            ));
        }
        unsafe { self.call(a.as_ptr(), b.as_ptr(), c.as_mut_ptr()) };
        Ok(())
    }
}

static GEMM_BF16: LazyLock<KernelCache<(GemmDesc, Tier), Bf16Inner>> =
    LazyLock::new(KernelCache::new);

pub(crate) fn resolve_gemm_bf16(
    desc: &GemmDesc,
    requested: Tier,
) -> Result<GemmBf16Kernel, ResolveError> {
    desc.validate()?;
    if desc.types != (DType::Bf16, DType::F32) {
        return Err(ResolveError::UnsupportedTypes(desc.types.0, desc.types.1));
    }
    let att = attribute(requested)?;
    let inner = GEMM_BF16.resolve_with((*desc, att.effective), || {
        let fdesc = GemmDesc {
            lda: desc.stored_rows_a(),
            ldb: desc.stored_rows_b(),
            types: (DType::F32, DType::F32),
            ..*desc
        };
        let built = build_gemm(&fdesc, att, gemm::ops_f32(att.variant));
        Ok(Bf16Inner {
            desc: *desc,
            fdesc,
            tier: att.effective,
            variant: att.variant,
            body: built.body,
        })
    })?;
    Ok(GemmBf16Kernel { inner })
}

struct SparseInner {
    desc: SparseDesc,
    tier: Tier,
    variant: Variant,
    program: SparseProgram,
    body: SparseFn<f32>,
}

/// A kernel specialized to one sparse pattern. The pattern is frozen at
/// generation time; nonzero values are passed per call, and a changed
/// pattern requires resolving a new kernel.
#[derive(Clone)]
pub struct SparseKernel {
    inner: Arc<SparseInner>,
}

impl SparseKernel {
    pub fn descriptor(&self) -> &SparseDesc {
        &self.inner.desc
    }

    pub fn effective_tier(&self) -> Tier {
        self.inner.tier
    }

    pub fn variant(&self) -> Variant {
        self.inner.variant
    }

    /// # Safety
    ///
    /// `a` must cover `lda * (k - 1) + rows` elements, `values` the
    /// pattern's nonzero count, and `c` `ldc * (cols - 1) + rows`
    /// elements.
    #[inline]
    pub unsafe fn call(&self, a: *const f32, values: *const f32, c: *mut f32) {
        (self.inner.body)(&self.inner.program, a, values, c)
    }

    /// Bounds-checked slice entry point.
    pub fn execute(&self, a: &[f32], values: &[f32], c: &mut [f32]) -> Result<(), ResolveError> {
        let d = &self.inner.desc;
        if a.len() < panel_len(d.lda, d.rows, d.k)
            || values.len() < d.nnz()
            || c.len() < panel_len(d.ldc, d.rows, d.cols)
        {
            return Err(ResolveError::InvalidDescriptor(
                "operand slice shorter than the descriptor's panel",
            ));
        }
        unsafe { self.call(a.as_ptr(), values.as_ptr(), c.as_mut_ptr()) };
        Ok(())
    }
}

static SPARSE_F32: LazyLock<KernelCache<(SparseDesc, Tier), SparseInner>> =
    LazyLock::new(KernelCache::new);

pub(crate) fn resolve_sparse_f32(
    desc: &SparseDesc,
    requested: Tier,
) -> Result<SparseKernel, ResolveError> {
    desc.validate()?;
    let att = attribute(requested)?;
    let inner = SPARSE_F32.resolve_with((desc.clone(), att.effective), || {
        Ok(SparseInner {
            desc: desc.clone(),
            tier: att.effective,
            variant: att.variant,
            program: SparseProgram::generate(desc),
            body: sparse::sparse_f32(att.variant),
        })
    })?;
    Ok(SparseKernel { inner })
}

struct CopyInner<E: Element> {
    desc: CopyDesc,
    tier: Tier,
    variant: Variant,
    body: CopyFn<E>,
}

/// A resolved matrix-copy kernel.
pub struct CopyKernel<E: Element> {
    inner: Arc<CopyInner<E>>,
}

impl<E: Element> Clone for CopyKernel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Element> CopyKernel<E> {
    pub fn descriptor(&self) -> &CopyDesc {
        &self.inner.desc
    }

    pub fn effective_tier(&self) -> Tier {
        self.inner.tier
    }

    pub fn variant(&self) -> Variant {
        self.inner.variant
    }

    /// # Safety
    ///
    /// `src` must cover `ldi * (n - 1) + m` elements and `dst`
    /// `ldo * (n - 1) + m`.
    #[inline]
    pub unsafe fn call(&self, src: *const E, dst: *mut E) {
        (self.inner.body)(&self.inner.desc, src, dst)
    }

    /// Bounds-checked slice entry point.
    pub fn execute(&self, src: &[E], dst: &mut [E]) -> Result<(), ResolveError> {
        let d = &self.inner.desc;
        if src.len() < panel_len(d.ldi, d.m, d.n) || dst.len() < panel_len(d.ldo, d.m, d.n) {
            return Err(ResolveError::InvalidDescriptor(
                "operand slice shorter than the descriptor's panel",
            ));
        }
        unsafe { self.call(src.as_ptr(), dst.as_mut_ptr()) };
        Ok(())
    }
}

struct TransInner<E: Element> {
    desc: TransDesc,
    tier: Tier,
    body: TransFn<E>,
}

/// A resolved out-of-place transpose kernel.
pub struct TransKernel<E: Element> {
    inner: Arc<TransInner<E>>,
}

impl<E: Element> Clone for TransKernel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Element> TransKernel<E> {
    pub fn descriptor(&self) -> &TransDesc {
        &self.inner.desc
    }

    pub fn effective_tier(&self) -> Tier {
        self.inner.tier
    }

    /// # Safety
    ///
    /// `src` must cover `ldi * (n - 1) + m` elements and `dst`
    /// `ldo * (m - 1) + n`.
    #[inline]
    pub unsafe fn call(&self, src: *const E, dst: *mut E) {
        (self.inner.body)(&self.inner.desc, src, dst)
    }

    /// Bounds-checked slice entry point.
    pub fn execute(&self, src: &[E], dst: &mut [E]) -> Result<(), ResolveError> {
        let d = &self.inner.desc;
        if src.len() < panel_len(d.ldi, d.m, d.n) || dst.len() < panel_len(d.ldo, d.n, d.m) {
            return Err(ResolveError::InvalidDescriptor(
                "operand slice shorter than the descriptor's panel",
            ));
        }
        unsafe { self.call(src.as_ptr(), dst.as_mut_ptr()) };
        Ok(())
    }
}

static COPY_F32: LazyLock<KernelCache<(CopyDesc, Tier), CopyInner<f32>>> =
    LazyLock::new(KernelCache::new);
static COPY_F64: LazyLock<KernelCache<(CopyDesc, Tier), CopyInner<f64>>> =
    LazyLock::new(KernelCache::new);
static TRANS_F32: LazyLock<KernelCache<(TransDesc, Tier), TransInner<f32>>> =
    LazyLock::new(KernelCache::new);
static TRANS_F64: LazyLock<KernelCache<(TransDesc, Tier), TransInner<f64>>> =
    LazyLock::new(KernelCache::new);

pub(crate) fn resolve_copy_f32(
    desc: &CopyDesc,
    requested: Tier,
) -> Result<CopyKernel<f32>, ResolveError> {
    desc.validate()?;
    let att = attribute(requested)?;
    let inner = COPY_F32.resolve_with((*desc, att.effective), || {
        Ok(CopyInner {
            desc: *desc,
            tier: att.effective,
            variant: att.variant,
            body: xcopy::matcopy_f32(att.variant),
        })
    })?;
    Ok(CopyKernel { inner })
}

pub(crate) fn resolve_copy_f64(
    desc: &CopyDesc,
    requested: Tier,
) -> Result<CopyKernel<f64>, ResolveError> {
    desc.validate()?;
    let att = attribute(requested)?;
    let inner = COPY_F64.resolve_with((*desc, att.effective), || {
        Ok(CopyInner {
            desc: *desc,
            tier: att.effective,
            variant: att.variant,
            body: xcopy::matcopy_f64(att.variant),
        })
    })?;
    Ok(CopyKernel { inner })
}

pub(crate) fn resolve_trans_f32(
    desc: &TransDesc,
    requested: Tier,
) -> Result<TransKernel<f32>, ResolveError> {
    desc.validate()?;
    let att = attribute(requested)?;
    let inner = TRANS_F32.resolve_with((*desc, att.effective), || {
        Ok(TransInner {
            desc: *desc,
            tier: att.effective,
            body: xcopy::transpose::<f32> as TransFn<f32>,
        })
    })?;
    Ok(TransKernel { inner })
}

pub(crate) fn resolve_trans_f64(
    desc: &TransDesc,
    requested: Tier,
) -> Result<TransKernel<f64>, ResolveError> {
    desc.validate()?;
    let att = attribute(requested)?;
    let inner = TRANS_F64.resolve_with((*desc, att.effective), || {
        Ok(TransInner {
            desc: *desc,
            tier: att.effective,
            body: xcopy::transpose::<f64> as TransFn<f64>,
        })
    })?;
    Ok(TransKernel { inner })
}
