//! DRM core and KMS tables
//!
//! Names drop the `DRM_` namespace that every core constant shares; the
//! legacy `_DRM_*` spellings are kept as the kernel headers write them.

use super::Xlat;

pub static CAPABILITY: Xlat = Xlat::new(
    &[
        (0x1, "CAP_DUMB_BUFFER"),
        (0x2, "CAP_VBLANK_HIGH_CRTC"),
        (0x3, "CAP_DUMB_PREFERRED_DEPTH"),
        (0x4, "CAP_DUMB_PREFER_SHADOW"),
        (0x5, "CAP_PRIME"),
        (0x6, "CAP_TIMESTAMP_MONOTONIC"),
        (0x7, "CAP_ASYNC_PAGE_FLIP"),
        (0x8, "CAP_CURSOR_WIDTH"),
        (0x9, "CAP_CURSOR_HEIGHT"),
        (0x10, "CAP_ADDFB2_MODIFIERS"),
        (0x11, "CAP_PAGE_FLIP_TARGET"),
        (0x12, "CAP_CRTC_IN_VBLANK_EVENT"),
        (0x13, "CAP_SYNCOBJ"),
        (0x14, "CAP_SYNCOBJ_TIMELINE"),
        (0x15, "CAP_ATOMIC_ASYNC_PAGE_FLIP"),
    ],
    "CAP_???",
);

pub static CLIENT_CAPABILITY: Xlat = Xlat::new(
    &[
        (1, "CLIENT_CAP_STEREO_3D"),
        (2, "CLIENT_CAP_UNIVERSAL_PLANES"),
        (3, "CLIENT_CAP_ATOMIC"),
        (4, "CLIENT_CAP_ASPECT_RATIO"),
        (5, "CLIENT_CAP_WRITEBACK_CONNECTORS"),
        (6, "CLIENT_CAP_CURSOR_PLANE_HOTSPOT"),
    ],
    "CLIENT_CAP_???",
);

pub static CONTROL_FUNC: Xlat = Xlat::new(
    &[
        (0, "ADD_COMMAND"),
        (1, "RM_COMMAND"),
        (2, "INST_HANDLER"),
        (3, "UNINST_HANDLER"),
    ],
    "DRM_???",
);

pub static CRTC_SEQUENCE_FLAGS: Xlat = Xlat::new(
    &[(0x1, "CRTC_SEQUENCE_RELATIVE"), (0x2, "CRTC_SEQUENCE_NEXT_ON_MISS")],
    "CRTC_SEQUENCE_???",
);

pub static CTX_FLAGS: Xlat = Xlat::new(
    &[(0x1, "_DRM_CONTEXT_PRESERVED"), (0x2, "_DRM_CONTEXT_2DONLY")],
    "_DRM_CONTEXT_???",
);

pub static LOCK_FLAGS: Xlat = Xlat::new(
    &[
        (0x01, "_DRM_LOCK_READY"),
        (0x02, "_DRM_LOCK_QUIESCENT"),
        (0x04, "_DRM_LOCK_FLUSH"),
        (0x08, "_DRM_LOCK_FLUSH_ALL"),
        (0x10, "_DRM_HALT_ALL_QUEUES"),
        (0x20, "_DRM_HALT_CUR_QUEUES"),
    ],
    "_DRM_LOCK_???",
);

pub static MODESET_CMD: Xlat = Xlat::new(
    &[(1, "_DRM_PRE_MODESET"), (2, "_DRM_POST_MODESET")],
    "_DRM_???",
);

pub static MODE_ENCODER_TYPE: Xlat = Xlat::new(
    &[
        (0, "MODE_ENCODER_NONE"),
        (1, "MODE_ENCODER_DAC"),
        (2, "MODE_ENCODER_TMDS"),
        (3, "MODE_ENCODER_LVDS"),
        (4, "MODE_ENCODER_TVDAC"),
        (5, "MODE_ENCODER_VIRTUAL"),
        (6, "MODE_ENCODER_DSI"),
        (7, "MODE_ENCODER_DPMST"),
        (8, "MODE_ENCODER_DPI"),
    ],
    "MODE_ENCODER_???",
);

pub static MODE_FLAGS: Xlat = Xlat::new(
    &[
        (0x0001, "MODE_FLAG_PHSYNC"),
        (0x0002, "MODE_FLAG_NHSYNC"),
        (0x0004, "MODE_FLAG_PVSYNC"),
        (0x0008, "MODE_FLAG_NVSYNC"),
        (0x0010, "MODE_FLAG_INTERLACE"),
        (0x0020, "MODE_FLAG_DBLSCAN"),
        (0x0040, "MODE_FLAG_CSYNC"),
        (0x0080, "MODE_FLAG_PCSYNC"),
        (0x0100, "MODE_FLAG_NCSYNC"),
        (0x0200, "MODE_FLAG_HSKEW"),
        (0x0400, "MODE_FLAG_BCAST"),
        (0x0800, "MODE_FLAG_PIXMUX"),
        (0x1000, "MODE_FLAG_DBLCLK"),
        (0x2000, "MODE_FLAG_CLKDIV2"),
    ],
    "MODE_FLAG_PIC_???",
);

// CLOCK_C and CRTC_C include the BUILTIN bit and must be tried first.
pub static MODE_TYPE: Xlat = Xlat::new(
    &[
        (0x03, "MODE_TYPE_CLOCK_C"),
        (0x05, "MODE_TYPE_CRTC_C"),
        (0x01, "MODE_TYPE_BUILTIN"),
        (0x08, "MODE_TYPE_PREFERRED"),
        (0x10, "MODE_TYPE_DEFAULT"),
        (0x20, "MODE_TYPE_USERDEF"),
        (0x40, "MODE_TYPE_DRIVER"),
    ],
    "MODE_TYPE_???",
);

pub static PAGE_FLIP_FLAGS: Xlat = Xlat::new(
    &[
        (0x1, "MODE_PAGE_FLIP_EVENT"),
        (0x2, "MODE_PAGE_FLIP_ASYNC"),
        (0x4, "MODE_PAGE_FLIP_TARGET_ABSOLUTE"),
        (0x8, "MODE_PAGE_FLIP_TARGET_RELATIVE"),
    ],
    "MODE_PAGE_FLIP_???",
);

pub static CURSOR_FLAGS: Xlat = Xlat::new(
    &[(0x1, "MODE_CURSOR_BO"), (0x2, "MODE_CURSOR_MOVE")],
    "MODE_CURSOR_???",
);

pub static DIRTYFB_FLAGS: Xlat = Xlat::new(
    &[(0x1, "MODE_FB_DIRTY_ANNOTATE_COPY"), (0x2, "MODE_FB_DIRTY_ANNOTATE_FILL")],
    "MODE_FB_DIRTY_???",
);

pub static ADDFB2_FLAGS: Xlat = Xlat::new(
    &[(0x1, "MODE_FB_INTERLACED"), (0x2, "MODE_FB_MODIFIERS")],
    "MODE_FB_???",
);

pub static ATOMIC_FLAGS: Xlat = Xlat::new(
    &[
        (0x0001, "MODE_PAGE_FLIP_EVENT"),
        (0x0002, "MODE_PAGE_FLIP_ASYNC"),
        (0x0100, "MODE_ATOMIC_TEST_ONLY"),
        (0x0200, "MODE_ATOMIC_NONBLOCK"),
        (0x0400, "MODE_ATOMIC_ALLOW_MODESET"),
    ],
    "MODE_ATOMIC_???",
);

pub static PROPERTY_FLAGS: Xlat = Xlat::new(
    &[
        (0x01, "MODE_PROP_PENDING"),
        (0x02, "MODE_PROP_RANGE"),
        (0x04, "MODE_PROP_IMMUTABLE"),
        (0x08, "MODE_PROP_ENUM"),
        (0x10, "MODE_PROP_BLOB"),
        (0x20, "MODE_PROP_BITMASK"),
        (0x40, "MODE_PROP_OBJECT"),
        (0x80, "MODE_PROP_SIGNED_RANGE"),
        (0x8000_0000, "MODE_PROP_ATOMIC"),
    ],
    "MODE_PROP_???",
);

pub static CONNECTION: Xlat = Xlat::new(
    &[(1, "connected"), (2, "disconnected"), (3, "unknown")],
    "connection_???",
);

pub static PRIME_FLAGS: Xlat = Xlat::new(
    &[(libc::O_RDWR as u64, "DRM_RDWR"), (libc::O_CLOEXEC as u64, "DRM_CLOEXEC")],
    "DRM_???",
);

pub static SYNCOBJ_FLAGS: Xlat = Xlat::new(
    &[(0x1, "SYNCOBJ_CREATE_SIGNALED")],
    "SYNCOBJ_???",
);

pub static SYNCOBJ_FD_FLAGS: Xlat = Xlat::new(
    &[(0x1, "SYNCOBJ_HANDLE_TO_FD_FLAGS_EXPORT_SYNC_FILE")],
    "SYNCOBJ_HANDLE_TO_FD_FLAGS_???",
);

pub static SYNCOBJ_FD_TO_HANDLE_FLAGS: Xlat = Xlat::new(
    &[(0x1, "SYNCOBJ_FD_TO_HANDLE_FLAGS_IMPORT_SYNC_FILE")],
    "SYNCOBJ_FD_TO_HANDLE_FLAGS_???",
);

pub static SYNCOBJ_WAIT_FLAGS: Xlat = Xlat::new(
    &[
        (0x1, "SYNCOBJ_WAIT_FLAGS_WAIT_ALL"),
        (0x2, "SYNCOBJ_WAIT_FLAGS_WAIT_FOR_SUBMIT"),
        (0x4, "SYNCOBJ_WAIT_FLAGS_WAIT_AVAILABLE"),
        (0x8, "SYNCOBJ_WAIT_FLAGS_WAIT_DEADLINE"),
    ],
    "SYNCOBJ_WAIT_FLAGS_???",
);

pub static LEASE_FLAGS: Xlat = Xlat::new(
    &[
        (libc::O_CLOEXEC as u64, "O_CLOEXEC"),
        (libc::O_NONBLOCK as u64, "O_NONBLOCK"),
    ],
    "O_???",
);

pub static MAP_TYPE: Xlat = Xlat::new(
    &[
        (0, "_DRM_FRAME_BUFFER"),
        (1, "_DRM_REGISTERS"),
        (2, "_DRM_SHM"),
        (3, "_DRM_AGP"),
        (4, "_DRM_SCATTER_GATHER"),
        (5, "_DRM_CONSISTENT"),
    ],
    "_DRM_???",
);

pub static MAP_FLAGS: Xlat = Xlat::new(
    &[
        (0x01, "_DRM_RESTRICTED"),
        (0x02, "_DRM_READ_ONLY"),
        (0x04, "_DRM_LOCKED"),
        (0x08, "_DRM_KERNEL"),
        (0x10, "_DRM_WRITE_COMBINING"),
        (0x20, "_DRM_CONTAINS_LOCK"),
        (0x40, "_DRM_REMOVABLE"),
        (0x80, "_DRM_DRIVER"),
    ],
    "_DRM_???",
);

pub static STAT_TYPE: Xlat = Xlat::new(
    &[
        (0, "_DRM_STAT_LOCK"),
        (1, "_DRM_STAT_OPENS"),
        (2, "_DRM_STAT_CLOSES"),
        (3, "_DRM_STAT_IOCTLS"),
        (4, "_DRM_STAT_LOCKS"),
        (5, "_DRM_STAT_UNLOCKS"),
        (6, "_DRM_STAT_VALUE"),
        (7, "_DRM_STAT_BYTE"),
        (8, "_DRM_STAT_COUNT"),
        (9, "_DRM_STAT_IRQ"),
        (10, "_DRM_STAT_PRIMARY"),
        (11, "_DRM_STAT_SECONDARY"),
        (12, "_DRM_STAT_DMA"),
        (13, "_DRM_STAT_SPECIAL"),
        (14, "_DRM_STAT_MISSED"),
    ],
    "_DRM_STAT_???",
);

pub static BUF_DESC_FLAGS: Xlat = Xlat::new(
    &[
        (0x01, "_DRM_PAGE_ALIGN"),
        (0x02, "_DRM_AGP_BUFFER"),
        (0x04, "_DRM_SG_BUFFER"),
        (0x08, "_DRM_FB_BUFFER"),
        (0x10, "_DRM_PCI_BUFFER_RO"),
    ],
    "_DRM_???",
);

/// Low bit of `drm_wait_vblank_request.type`.
pub static VBLANK_SEQ_TYPE: Xlat = Xlat::new(
    &[(0, "_DRM_VBLANK_ABSOLUTE"), (1, "_DRM_VBLANK_RELATIVE")],
    "_DRM_VBLANK_???",
);

pub const VBLANK_TYPES_MASK: u64 = 0x1;

pub static VBLANK_SEQ_FLAGS: Xlat = Xlat::new(
    &[
        (0x0400_0000, "_DRM_VBLANK_EVENT"),
        (0x0800_0000, "_DRM_VBLANK_FLIP"),
        (0x1000_0000, "_DRM_VBLANK_NEXTONMISS"),
        (0x2000_0000, "_DRM_VBLANK_SECONDARY"),
        (0x4000_0000, "_DRM_VBLANK_SIGNAL"),
    ],
    "_DRM_VBLANK_???",
);
