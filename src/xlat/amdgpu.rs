//! amdgpu driver tables

use super::Xlat;

pub static GEM_DOMAINS: Xlat = Xlat::new(
    &[
        (0x01, "AMDGPU_GEM_DOMAIN_CPU"),
        (0x02, "AMDGPU_GEM_DOMAIN_GTT"),
        (0x04, "AMDGPU_GEM_DOMAIN_VRAM"),
        (0x08, "AMDGPU_GEM_DOMAIN_GDS"),
        (0x10, "AMDGPU_GEM_DOMAIN_GWS"),
        (0x20, "AMDGPU_GEM_DOMAIN_OA"),
        (0x40, "AMDGPU_GEM_DOMAIN_DOORBELL"),
    ],
    "AMDGPU_GEM_DOMAIN_???",
);

pub static GEM_CREATE_FLAGS: Xlat = Xlat::new(
    &[
        (1 << 0, "AMDGPU_GEM_CREATE_CPU_ACCESS_REQUIRED"),
        (1 << 1, "AMDGPU_GEM_CREATE_NO_CPU_ACCESS"),
        (1 << 2, "AMDGPU_GEM_CREATE_CPU_GTT_USWC"),
        (1 << 3, "AMDGPU_GEM_CREATE_VRAM_CLEARED"),
        (1 << 5, "AMDGPU_GEM_CREATE_VRAM_CONTIGUOUS"),
        (1 << 6, "AMDGPU_GEM_CREATE_VM_ALWAYS_VALID"),
        (1 << 7, "AMDGPU_GEM_CREATE_EXPLICIT_SYNC"),
        (1 << 8, "AMDGPU_GEM_CREATE_CP_MQD_GFX9"),
        (1 << 9, "AMDGPU_GEM_CREATE_VRAM_WIPE_ON_RELEASE"),
        (1 << 10, "AMDGPU_GEM_CREATE_ENCRYPTED"),
        (1 << 11, "AMDGPU_GEM_CREATE_PREEMPTIBLE"),
        (1 << 12, "AMDGPU_GEM_CREATE_DISCARDABLE"),
        (1 << 13, "AMDGPU_GEM_CREATE_COHERENT"),
        (1 << 14, "AMDGPU_GEM_CREATE_UNCACHED"),
        (1 << 15, "AMDGPU_GEM_CREATE_EXT_COHERENT"),
    ],
    "AMDGPU_GEM_CREATE_???",
);

pub const CTX_OP_ALLOC_CTX: u64 = 1;
pub const CTX_OP_FREE_CTX: u64 = 2;
pub const CTX_OP_QUERY_STATE: u64 = 3;
pub const CTX_OP_QUERY_STATE2: u64 = 4;

pub static CTX_OP: Xlat = Xlat::new(
    &[
        (CTX_OP_ALLOC_CTX, "AMDGPU_CTX_OP_ALLOC_CTX"),
        (CTX_OP_FREE_CTX, "AMDGPU_CTX_OP_FREE_CTX"),
        (CTX_OP_QUERY_STATE, "AMDGPU_CTX_OP_QUERY_STATE"),
        (CTX_OP_QUERY_STATE2, "AMDGPU_CTX_OP_QUERY_STATE2"),
        (5, "AMDGPU_CTX_OP_GET_STABLE_PSTATE"),
        (6, "AMDGPU_CTX_OP_SET_STABLE_PSTATE"),
    ],
    "AMDGPU_CTX_OP_???",
);

// Priorities are signed 32-bit values, stored sign-extended.
pub static CTX_PRIORITY: Xlat = Xlat::new(
    &[
        (-2048i64 as u64, "AMDGPU_CTX_PRIORITY_UNSET"),
        (-1023i64 as u64, "AMDGPU_CTX_PRIORITY_VERY_LOW"),
        (-512i64 as u64, "AMDGPU_CTX_PRIORITY_LOW"),
        (0, "AMDGPU_CTX_PRIORITY_NORMAL"),
        (512, "AMDGPU_CTX_PRIORITY_HIGH"),
        (1023, "AMDGPU_CTX_PRIORITY_VERY_HIGH"),
    ],
    "AMDGPU_CTX_PRIORITY_???",
);

pub static CTX_RESET_STATUS: Xlat = Xlat::new(
    &[
        (0, "AMDGPU_CTX_NO_RESET"),
        (1, "AMDGPU_CTX_GUILTY_RESET"),
        (2, "AMDGPU_CTX_INNOCENT_RESET"),
        (3, "AMDGPU_CTX_UNKNOWN_RESET"),
    ],
    "AMDGPU_CTX_???_RESET",
);

pub static CTX_QUERY2_FLAGS: Xlat = Xlat::new(
    &[
        (0x01, "AMDGPU_CTX_QUERY2_FLAGS_RESET"),
        (0x02, "AMDGPU_CTX_QUERY2_FLAGS_VRAMLOST"),
        (0x04, "AMDGPU_CTX_QUERY2_FLAGS_GUILTY"),
        (0x08, "AMDGPU_CTX_QUERY2_FLAGS_RAS_CE"),
        (0x10, "AMDGPU_CTX_QUERY2_FLAGS_RAS_UE"),
    ],
    "AMDGPU_CTX_QUERY2_FLAGS_???",
);

pub static BO_LIST_OPERATION: Xlat = Xlat::new(
    &[
        (0, "AMDGPU_BO_LIST_OP_CREATE"),
        (1, "AMDGPU_BO_LIST_OP_DESTROY"),
        (2, "AMDGPU_BO_LIST_OP_UPDATE"),
    ],
    "AMDGPU_BO_LIST_OP_???",
);

pub static INFO_QUERY: Xlat = Xlat::new(
    &[
        (0x00, "AMDGPU_INFO_ACCEL_WORKING"),
        (0x01, "AMDGPU_INFO_CRTC_FROM_ID"),
        (0x02, "AMDGPU_INFO_HW_IP_INFO"),
        (0x03, "AMDGPU_INFO_HW_IP_COUNT"),
        (0x05, "AMDGPU_INFO_TIMESTAMP"),
        (0x0e, "AMDGPU_INFO_FW_VERSION"),
        (0x0f, "AMDGPU_INFO_NUM_BYTES_MOVED"),
        (0x10, "AMDGPU_INFO_VRAM_USAGE"),
        (0x11, "AMDGPU_INFO_GTT_USAGE"),
        (0x13, "AMDGPU_INFO_GDS_CONFIG"),
        (0x14, "AMDGPU_INFO_VRAM_GTT"),
        (0x15, "AMDGPU_INFO_READ_MMR_REG"),
        (0x16, "AMDGPU_INFO_DEV_INFO"),
        (0x17, "AMDGPU_INFO_VIS_VRAM_USAGE"),
        (0x18, "AMDGPU_INFO_NUM_EVICTIONS"),
        (0x19, "AMDGPU_INFO_MEMORY"),
        (0x1a, "AMDGPU_INFO_VCE_CLOCK_TABLE"),
        (0x1b, "AMDGPU_INFO_VBIOS"),
        (0x1c, "AMDGPU_INFO_NUM_HANDLES"),
        (0x1d, "AMDGPU_INFO_SENSOR"),
        (0x1e, "AMDGPU_INFO_NUM_VRAM_CPU_PAGE_FAULTS"),
        (0x1f, "AMDGPU_INFO_VRAM_LOST_COUNTER"),
        (0x20, "AMDGPU_INFO_RAS_ENABLED_FEATURES"),
        (0x21, "AMDGPU_INFO_VIDEO_CAPS"),
        (0x22, "AMDGPU_INFO_MAX_IBS"),
        (0x23, "AMDGPU_INFO_GPUVM_FAULT"),
    ],
    "AMDGPU_INFO_???",
);

pub const GEM_METADATA_OP_SET_METADATA: u64 = 2;

pub static GEM_METADATA_OP: Xlat = Xlat::new(
    &[
        (1, "AMDGPU_GEM_METADATA_OP_GET_METADATA"),
        (GEM_METADATA_OP_SET_METADATA, "AMDGPU_GEM_METADATA_OP_SET_METADATA"),
    ],
    "AMDGPU_GEM_METADATA_OP_???",
);

pub static GEM_VA_OP: Xlat = Xlat::new(
    &[
        (1, "AMDGPU_VA_OP_MAP"),
        (2, "AMDGPU_VA_OP_UNMAP"),
        (3, "AMDGPU_VA_OP_CLEAR"),
        (4, "AMDGPU_VA_OP_REPLACE"),
    ],
    "AMDGPU_VA_OP_???",
);

pub static GEM_VA_FLAGS: Xlat = Xlat::new(
    &[
        (1 << 0, "AMDGPU_VM_DELAY_UPDATE"),
        (1 << 1, "AMDGPU_VM_PAGE_READABLE"),
        (1 << 2, "AMDGPU_VM_PAGE_WRITEABLE"),
        (1 << 3, "AMDGPU_VM_PAGE_EXECUTABLE"),
        (1 << 4, "AMDGPU_VM_PAGE_PRT"),
        (1 << 9, "AMDGPU_VM_PAGE_NOALLOC"),
    ],
    "AMDGPU_VM_PAGE_???",
);

pub static GEM_OP_OP: Xlat = Xlat::new(
    &[
        (0, "AMDGPU_GEM_OP_GET_GEM_CREATE_INFO"),
        (1, "AMDGPU_GEM_OP_SET_PLACEMENT"),
    ],
    "AMDGPU_GEM_OP_???",
);

pub static GEM_USERPTR_FLAGS: Xlat = Xlat::new(
    &[
        (1 << 0, "AMDGPU_GEM_USERPTR_READONLY"),
        (1 << 1, "AMDGPU_GEM_USERPTR_ANONONLY"),
        (1 << 2, "AMDGPU_GEM_USERPTR_VALIDATE"),
        (1 << 3, "AMDGPU_GEM_USERPTR_REGISTER"),
    ],
    "AMDGPU_GEM_USERPTR_???",
);

pub static VM_OP: Xlat = Xlat::new(
    &[
        (1, "AMDGPU_VM_OP_RESERVE_VMID"),
        (2, "AMDGPU_VM_OP_UNRESERVE_VMID"),
    ],
    "AMDGPU_VM_OP_???",
);

pub static FENCE_TO_HANDLE_WHAT: Xlat = Xlat::new(
    &[
        (0, "AMDGPU_FENCE_TO_HANDLE_GET_SYNCOBJ"),
        (1, "AMDGPU_FENCE_TO_HANDLE_GET_SYNCOBJ_FD"),
        (2, "AMDGPU_FENCE_TO_HANDLE_GET_SYNC_FILE_FD"),
    ],
    "AMDGPU_FENCE_TO_HANDLE_GET_???",
);

pub static SCHED_OP: Xlat = Xlat::new(
    &[
        (1, "AMDGPU_SCHED_OP_PROCESS_PRIORITY_OVERRIDE"),
        (2, "AMDGPU_SCHED_OP_CONTEXT_PRIORITY_OVERRIDE"),
    ],
    "AMDGPU_SCHED_OP_???",
);
