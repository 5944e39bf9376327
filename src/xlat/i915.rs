//! i915 driver tables

use super::Xlat;

pub const PARAM_CHIPSET_ID: u64 = 4;

pub static GETPARAMS: Xlat = Xlat::new(
    &[
        (1, "I915_PARAM_IRQ_ACTIVE"),
        (2, "I915_PARAM_ALLOW_BATCHBUFFER"),
        (3, "I915_PARAM_LAST_DISPATCH"),
        (PARAM_CHIPSET_ID, "I915_PARAM_CHIPSET_ID"),
        (5, "I915_PARAM_HAS_GEM"),
        (6, "I915_PARAM_NUM_FENCES_AVAIL"),
        (7, "I915_PARAM_HAS_OVERLAY"),
        (8, "I915_PARAM_HAS_PAGEFLIPPING"),
        (9, "I915_PARAM_HAS_EXECBUF2"),
        (10, "I915_PARAM_HAS_BSD"),
        (11, "I915_PARAM_HAS_BLT"),
        (12, "I915_PARAM_HAS_RELAXED_FENCING"),
        (13, "I915_PARAM_HAS_COHERENT_RINGS"),
        (14, "I915_PARAM_HAS_EXEC_CONSTANTS"),
        (15, "I915_PARAM_HAS_RELAXED_DELTA"),
        (16, "I915_PARAM_HAS_GEN7_SOL_RESET"),
        (17, "I915_PARAM_HAS_LLC"),
        (18, "I915_PARAM_HAS_ALIASING_PPGTT"),
        (19, "I915_PARAM_HAS_WAIT_TIMEOUT"),
        (20, "I915_PARAM_HAS_SEMAPHORES"),
        (21, "I915_PARAM_HAS_PRIME_VMAP_FLUSH"),
        (22, "I915_PARAM_HAS_VEBOX"),
        (23, "I915_PARAM_HAS_SECURE_BATCHES"),
        (24, "I915_PARAM_HAS_PINNED_BATCHES"),
        (25, "I915_PARAM_HAS_EXEC_NO_RELOC"),
        (26, "I915_PARAM_HAS_EXEC_HANDLE_LUT"),
        (27, "I915_PARAM_HAS_WT"),
        (28, "I915_PARAM_CMD_PARSER_VERSION"),
        (29, "I915_PARAM_HAS_COHERENT_PHYS_GTT"),
        (30, "I915_PARAM_MMAP_VERSION"),
        (31, "I915_PARAM_HAS_BSD2"),
        (32, "I915_PARAM_REVISION"),
        (33, "I915_PARAM_SUBSLICE_TOTAL"),
        (34, "I915_PARAM_EU_TOTAL"),
        (35, "I915_PARAM_HAS_GPU_RESET"),
        (36, "I915_PARAM_HAS_RESOURCE_STREAMER"),
        (37, "I915_PARAM_HAS_EXEC_SOFTPIN"),
        (38, "I915_PARAM_HAS_POOLED_EU"),
        (39, "I915_PARAM_MIN_EU_IN_POOL"),
        (40, "I915_PARAM_MMAP_GTT_VERSION"),
    ],
    "I915_PARAM_???",
);

pub static SETPARAMS: Xlat = Xlat::new(
    &[
        (1, "I915_SETPARAM_USE_MI_BATCHBUFFER_START"),
        (2, "I915_SETPARAM_TEX_LRU_LOG_GRANULARITY"),
        (3, "I915_SETPARAM_ALLOW_BATCHBUFFER"),
        (4, "I915_SETPARAM_NUM_USED_FENCES"),
    ],
    "I915_SETPARAM_???",
);

pub static GEM_DOMAINS: Xlat = Xlat::new(
    &[
        (0x01, "I915_GEM_DOMAIN_CPU"),
        (0x02, "I915_GEM_DOMAIN_RENDER"),
        (0x04, "I915_GEM_DOMAIN_SAMPLER"),
        (0x08, "I915_GEM_DOMAIN_COMMAND"),
        (0x10, "I915_GEM_DOMAIN_INSTRUCTION"),
        (0x20, "I915_GEM_DOMAIN_VERTEX"),
        (0x40, "I915_GEM_DOMAIN_GTT"),
        (0x80, "I915_GEM_DOMAIN_WC"),
    ],
    "I915_GEM_DOMAIN_???",
);

pub static TILING_MODES: Xlat = Xlat::new(
    &[
        (0, "I915_TILING_NONE"),
        (1, "I915_TILING_X"),
        (2, "I915_TILING_Y"),
    ],
    "I915_TILING_???",
);

pub static SWIZZLE_MODES: Xlat = Xlat::new(
    &[
        (0, "I915_BIT_6_SWIZZLE_NONE"),
        (1, "I915_BIT_6_SWIZZLE_9"),
        (2, "I915_BIT_6_SWIZZLE_9_10"),
        (3, "I915_BIT_6_SWIZZLE_9_11"),
        (4, "I915_BIT_6_SWIZZLE_9_10_11"),
        (5, "I915_BIT_6_SWIZZLE_9_17"),
        (6, "I915_BIT_6_SWIZZLE_9_10_17"),
        (7, "I915_BIT_6_SWIZZLE_UNKNOWN"),
    ],
    "I915_BIT_6_SWIZZLE_???",
);

pub static MADVISE: Xlat = Xlat::new(
    &[(0, "I915_MADV_WILLNEED"), (1, "I915_MADV_DONTNEED")],
    "I915_MADV_???",
);

pub static USERPTR_FLAGS: Xlat = Xlat::new(
    &[
        (0x1, "I915_USERPTR_READ_ONLY"),
        (0x2, "I915_USERPTR_PROBE"),
        (0x8000_0000, "I915_USERPTR_UNSYNCHRONIZED"),
    ],
    "I915_USERPTR_???",
);
