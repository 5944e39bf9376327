//! amdgpu driver commands
//!
//! Most amdgpu records are `in`/`out` unions: the caller fills `in`, the
//! kernel overwrites the same bytes with `out`. Entry prints `{in={...}`
//! and a successful exit appends `, out={...}}`.

use crate::decode::{DecodeCtx, Step};
use crate::ioc::hex;
use crate::personality::{Field, RecordDesc, Scalar};
use crate::record::Record;
use crate::registry::CommandSpec;
use crate::session::Stash;
use crate::xlat::amdgpu as xlat;

static GEM_CREATE_IN: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_gem_create_in",
    &[
        Field::u64("bo_size"),
        Field::u64("alignment"),
        Field::u64("domains"),
        Field::u64("domain_flags"),
    ],
);

static HANDLE_OUT: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_handle_out",
    &[Field::u32("handle"), Field::u32("_pad")],
);

static GEM_CREATE: RecordDesc = RecordDesc::union(
    "drm_amdgpu_gem_create",
    &[
        Field::record("in", &GEM_CREATE_IN),
        Field::record("out", &HANDLE_OUT),
    ],
);

static GEM_MMAP_OUT: RecordDesc =
    RecordDesc::structure("drm_amdgpu_gem_mmap_out", &[Field::u64("addr_ptr")]);

static GEM_MMAP: RecordDesc = RecordDesc::union(
    "drm_amdgpu_gem_mmap",
    &[
        Field::record("in", &HANDLE_OUT),
        Field::record("out", &GEM_MMAP_OUT),
    ],
);

static CTX_IN: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_ctx_in",
    &[
        Field::u32("op"),
        Field::u32("flags"),
        Field::u32("ctx_id"),
        Field::i32("priority"),
    ],
);

static CTX_ALLOC: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_ctx_out_alloc",
    &[Field::u32("ctx_id"), Field::u32("_pad")],
);

static CTX_STATE: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_ctx_out_state",
    &[Field::u64("flags"), Field::u32("hangs"), Field::u32("reset_status")],
);

static CTX_OUT: RecordDesc = RecordDesc::union(
    "drm_amdgpu_ctx_out",
    &[
        Field::record("alloc", &CTX_ALLOC),
        Field::record("state", &CTX_STATE),
    ],
);

static CTX: RecordDesc = RecordDesc::union(
    "drm_amdgpu_ctx",
    &[Field::record("in", &CTX_IN), Field::record("out", &CTX_OUT)],
);

static BO_LIST_IN: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_bo_list_in",
    &[
        Field::u32("operation"),
        Field::u32("list_handle"),
        Field::u32("bo_number"),
        Field::u32("bo_info_size"),
        Field::u64("bo_info_ptr"),
    ],
);

static BO_LIST_OUT: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_bo_list_out",
    &[Field::u32("list_handle"), Field::u32("_pad")],
);

static BO_LIST: RecordDesc = RecordDesc::union(
    "drm_amdgpu_bo_list",
    &[
        Field::record("in", &BO_LIST_IN),
        Field::record("out", &BO_LIST_OUT),
    ],
);

static CS_IN: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_cs_in",
    &[
        Field::u32("ctx_id"),
        Field::u32("bo_list_handle"),
        Field::u32("num_chunks"),
        Field::u32("flags"),
        Field::u64("chunks"),
    ],
);

static CS_OUT: RecordDesc =
    RecordDesc::structure("drm_amdgpu_cs_out", &[Field::u64("handle")]);

static CS: RecordDesc = RecordDesc::union(
    "drm_amdgpu_cs",
    &[Field::record("in", &CS_IN), Field::record("out", &CS_OUT)],
);

static INFO: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_info",
    &[
        Field::u64("return_pointer"),
        Field::u32("return_size"),
        Field::u32("query"),
        Field::bytes("query_args", 16),
    ],
);

static METADATA_DATA: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_gem_metadata_data",
    &[
        Field::u64("flags"),
        Field::u64("tiling_info"),
        Field::u32("data_size_bytes"),
        Field::array("data", Scalar::U32, 64),
    ],
);

static GEM_METADATA: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_gem_metadata",
    &[
        Field::u32("handle"),
        Field::u32("op"),
        Field::record("data", &METADATA_DATA),
    ],
);

static WAIT_IDLE_IN: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_gem_wait_idle_in",
    &[Field::u32("handle"), Field::u32("flags"), Field::u64("timeout")],
);

static WAIT_IDLE_OUT: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_gem_wait_idle_out",
    &[Field::u32("status"), Field::u32("domain")],
);

static GEM_WAIT_IDLE: RecordDesc = RecordDesc::union(
    "drm_amdgpu_gem_wait_idle",
    &[
        Field::record("in", &WAIT_IDLE_IN),
        Field::record("out", &WAIT_IDLE_OUT),
    ],
);

static GEM_VA: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_gem_va",
    &[
        Field::u32("handle"),
        Field::u32("_pad"),
        Field::u32("operation"),
        Field::u32("flags"),
        Field::u64("va_address"),
        Field::u64("offset_in_bo"),
        Field::u64("map_size"),
    ],
);

static WAIT_CS_IN: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_wait_cs_in",
    &[
        Field::u64("handle"),
        Field::u64("timeout"),
        Field::u32("ip_type"),
        Field::u32("ip_instance"),
        Field::u32("ring"),
        Field::u32("ctx_id"),
    ],
);

static STATUS_OUT: RecordDesc =
    RecordDesc::structure("drm_amdgpu_wait_cs_out", &[Field::u64("status")]);

static WAIT_CS: RecordDesc = RecordDesc::union(
    "drm_amdgpu_wait_cs",
    &[
        Field::record("in", &WAIT_CS_IN),
        Field::record("out", &STATUS_OUT),
    ],
);

static GEM_OP: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_gem_op",
    &[Field::u32("handle"), Field::u32("op"), Field::u64("value")],
);

static GEM_USERPTR: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_gem_userptr",
    &[
        Field::u64("addr"),
        Field::u64("size"),
        Field::u32("flags"),
        Field::u32("handle"),
    ],
);

static WAIT_FENCES_IN: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_wait_fences_in",
    &[
        Field::u64("fences"),
        Field::u32("fence_count"),
        Field::u32("wait_all"),
        Field::u64("timeout_ns"),
    ],
);

static WAIT_FENCES_OUT: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_wait_fences_out",
    &[Field::u32("status"), Field::u32("first_signaled")],
);

static WAIT_FENCES: RecordDesc = RecordDesc::union(
    "drm_amdgpu_wait_fences",
    &[
        Field::record("in", &WAIT_FENCES_IN),
        Field::record("out", &WAIT_FENCES_OUT),
    ],
);

static VM_IN: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_vm_in",
    &[Field::u32("op"), Field::u32("flags")],
);

static VM_OUT: RecordDesc =
    RecordDesc::structure("drm_amdgpu_vm_out", &[Field::u64("flags")]);

static VM: RecordDesc = RecordDesc::union(
    "drm_amdgpu_vm",
    &[Field::record("in", &VM_IN), Field::record("out", &VM_OUT)],
);

static FENCE: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_fence",
    &[
        Field::u32("ctx_id"),
        Field::u32("ip_type"),
        Field::u32("ip_instance"),
        Field::u32("ring"),
        Field::u64("seq_no"),
    ],
);

static FENCE_TO_HANDLE_IN: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_fence_to_handle_in",
    &[
        Field::record("fence", &FENCE),
        Field::u32("what"),
        Field::u32("pad"),
    ],
);

static FENCE_TO_HANDLE: RecordDesc = RecordDesc::union(
    "drm_amdgpu_fence_to_handle",
    &[
        Field::record("in", &FENCE_TO_HANDLE_IN),
        Field::record("out", &HANDLE_OUT),
    ],
);

static SCHED_IN: RecordDesc = RecordDesc::structure(
    "drm_amdgpu_sched_in",
    &[
        Field::u32("op"),
        Field::i32("fd"),
        Field::i32("priority"),
        Field::u32("ctx_id"),
    ],
);

static SCHED: RecordDesc =
    RecordDesc::union("drm_amdgpu_sched", &[Field::record("in", &SCHED_IN)]);

/// Opens `in={`; the closure prints its fields.
fn input<F>(ctx: &mut DecodeCtx<'_>, f: F) -> Step
where
    F: FnOnce(&mut DecodeCtx<'_>, &Record),
{
    ctx.begin(|ctx, r| {
        ctx.out.open_field("in");
        f(ctx, r);
        ctx.out.close();
    })
}

/// `, out={...}` after a successful call, then the outer brace.
fn output<F>(ctx: &mut DecodeCtx<'_>, f: F) -> Step
where
    F: FnOnce(&mut DecodeCtx<'_>, &Record),
{
    ctx.finish(|ctx, r| {
        ctx.out.open_field("out");
        f(ctx, r);
        ctx.out.close();
    })
}

fn out_handle(ctx: &mut DecodeCtx<'_>) -> Step {
    output(ctx, |ctx, r| ctx.out.u(r, "out.handle"))
}

fn gem_create_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    input(ctx, |ctx, r| {
        ctx.out.u(r, "in.bo_size");
        ctx.out.u(r, "in.alignment");
        ctx.out.flags(r, "in.domains", &xlat::GEM_DOMAINS);
        ctx.out.flags(r, "in.domain_flags", &xlat::GEM_CREATE_FLAGS);
    })
}

fn gem_mmap_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    input(ctx, |ctx, r| ctx.out.u(r, "in.handle"))
}

fn gem_mmap_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    output(ctx, |ctx, r| ctx.out.ptr(r, "out.addr_ptr"))
}

fn ctx_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    input(ctx, |ctx, r| {
        let op = r.get("in.op");
        ctx.stash(Stash::AmdgpuCtxOp(op));
        ctx.out.xval(r, "in.op", &xlat::CTX_OP);
        ctx.out.x(r, "in.flags");
        ctx.out.u(r, "in.ctx_id");
        ctx.out.xval(r, "in.priority", &xlat::CTX_PRIORITY);
    })
}

fn ctx_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    let op = match ctx.take_stash() {
        Some(Stash::AmdgpuCtxOp(op)) => op,
        _ => return ctx.finish(|_, _| {}),
    };
    ctx.finish(|ctx, r| match op {
        xlat::CTX_OP_ALLOC_CTX => {
            ctx.out.open_field("out");
            ctx.out.open_field("alloc");
            ctx.out.u(r, "out.alloc.ctx_id");
            ctx.out.close();
            ctx.out.close();
        }
        xlat::CTX_OP_FREE_CTX => {
            ctx.out.open_field("out");
            ctx.out.close();
        }
        xlat::CTX_OP_QUERY_STATE | xlat::CTX_OP_QUERY_STATE2 => {
            ctx.out.open_field("out");
            ctx.out.open_field("state");
            if op == xlat::CTX_OP_QUERY_STATE2 {
                ctx.out.flags(r, "out.state.flags", &xlat::CTX_QUERY2_FLAGS);
            } else {
                ctx.out.x(r, "out.state.flags");
            }
            ctx.out.u(r, "out.state.hangs");
            ctx.out.xval(r, "out.state.reset_status", &xlat::CTX_RESET_STATUS);
            ctx.out.close();
            ctx.out.close();
        }
        _ => {}
    })
}

fn bo_list_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    input(ctx, |ctx, r| {
        ctx.out.xval(r, "in.operation", &xlat::BO_LIST_OPERATION);
        ctx.out.u(r, "in.list_handle");
        ctx.out.u(r, "in.bo_number");
        ctx.out.u(r, "in.bo_info_size");
        ctx.out.ptr(r, "in.bo_info_ptr");
    })
}

fn bo_list_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    output(ctx, |ctx, r| ctx.out.u(r, "out.list_handle"))
}

fn cs_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    input(ctx, |ctx, r| {
        ctx.out.u(r, "in.ctx_id");
        ctx.out.u(r, "in.bo_list_handle");
        ctx.out.u(r, "in.num_chunks");
        ctx.out.x(r, "in.flags");
        ctx.out.ptr(r, "in.chunks");
    })
}

fn info(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.ptr(r, "return_pointer");
        ctx.out.u(r, "return_size");
        ctx.out.xval(r, "query", &xlat::INFO_QUERY);
    })
}

/// `data={...}` of a metadata record; only `data_size_bytes` of the words
/// carry anything.
fn print_metadata(ctx: &mut DecodeCtx<'_>, r: &Record) {
    ctx.out.open_field("data");
    ctx.out.x(r, "data.flags");
    ctx.out.x(r, "data.tiling_info");
    ctx.out.u(r, "data.data_size_bytes");
    let words = (r.get("data.data_size_bytes") as usize)
        .div_ceil(4)
        .min(r.array_len("data.data"));
    let cap = ctx.config().max_array_elements;
    ctx.out.label("data");
    ctx.out.open_array();
    for index in 0..words.min(cap) {
        ctx.out.item();
        ctx.out.raw(&hex(r.elem("data.data", index)));
    }
    if words > cap {
        ctx.out.ellipsis();
    }
    ctx.out.close();
    ctx.out.close();
}

fn gem_metadata_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        let op = r.get("op");
        ctx.out.u(r, "handle");
        ctx.out.xval(r, "op", &xlat::GEM_METADATA_OP);
        if op == xlat::GEM_METADATA_OP_SET_METADATA {
            print_metadata(ctx, r);
        } else {
            ctx.stash(Stash::AmdgpuMetadataOp(op));
        }
    })
}

fn gem_metadata_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    if !matches!(ctx.take_stash(), Some(Stash::AmdgpuMetadataOp(_))) {
        return ctx.finish(|_, _| {});
    }
    ctx.finish(print_metadata)
}

fn gem_wait_idle_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    input(ctx, |ctx, r| {
        ctx.out.u(r, "in.handle");
        ctx.out.x(r, "in.flags");
        ctx.out.u(r, "in.timeout");
    })
}

fn gem_wait_idle_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    output(ctx, |ctx, r| {
        ctx.out.u(r, "out.status");
        ctx.out.flags(r, "out.domain", &xlat::GEM_DOMAINS);
    })
}

fn gem_va(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "handle");
        ctx.out.xval(r, "operation", &xlat::GEM_VA_OP);
        ctx.out.flags(r, "flags", &xlat::GEM_VA_FLAGS);
        ctx.out.x(r, "va_address");
        ctx.out.x(r, "offset_in_bo");
        ctx.out.u(r, "map_size");
    })
}

fn wait_cs_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    input(ctx, |ctx, r| {
        ctx.out.u(r, "in.handle");
        ctx.out.u(r, "in.timeout");
        ctx.out.u(r, "in.ip_type");
        ctx.out.u(r, "in.ip_instance");
        ctx.out.u(r, "in.ring");
        ctx.out.u(r, "in.ctx_id");
    })
}

fn wait_cs_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    output(ctx, |ctx, r| ctx.out.u(r, "out.status"))
}

fn gem_op(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "handle");
        ctx.out.xval(r, "op", &xlat::GEM_OP_OP);
        ctx.out.u(r, "value");
    })
}

fn gem_userptr_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.x(r, "addr");
        ctx.out.u(r, "size");
        ctx.out.flags(r, "flags", &xlat::GEM_USERPTR_FLAGS);
    })
}

fn gem_userptr_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.u(r, "handle"))
}

fn wait_fences_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    input(ctx, |ctx, r| {
        ctx.out.ptr(r, "in.fences");
        ctx.out.u(r, "in.fence_count");
        ctx.out.u(r, "in.wait_all");
        ctx.out.u(r, "in.timeout_ns");
    })
}

fn wait_fences_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    output(ctx, |ctx, r| {
        ctx.out.u(r, "out.status");
        ctx.out.u(r, "out.first_signaled");
    })
}

fn vm(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.open_field("in");
        ctx.out.xval(r, "in.op", &xlat::VM_OP);
        ctx.out.x(r, "in.flags");
        ctx.out.close();
    })
}

fn fence_to_handle_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    input(ctx, |ctx, r| {
        ctx.out.open_field("fence");
        ctx.out.u(r, "in.fence.ctx_id");
        ctx.out.u(r, "in.fence.ip_type");
        ctx.out.u(r, "in.fence.ip_instance");
        ctx.out.u(r, "in.fence.ring");
        ctx.out.u(r, "in.fence.seq_no");
        ctx.out.close();
        ctx.out.xval(r, "in.what", &xlat::FENCE_TO_HANDLE_WHAT);
    })
}

fn sched(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.open_field("in");
        ctx.out.xval(r, "in.op", &xlat::SCHED_OP);
        ctx.out.d(r, "in.fd");
        ctx.out.xval(r, "in.priority", &xlat::CTX_PRIORITY);
        ctx.out.u(r, "in.ctx_id");
        ctx.out.close();
    })
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec::iowr("DRM_IOCTL_AMDGPU_GEM_CREATE", 0x40, &GEM_CREATE)
        .enter(gem_create_enter)
        .exit(out_handle),
    CommandSpec::iowr("DRM_IOCTL_AMDGPU_GEM_MMAP", 0x41, &GEM_MMAP)
        .enter(gem_mmap_enter)
        .exit(gem_mmap_exit),
    CommandSpec::iowr("DRM_IOCTL_AMDGPU_CTX", 0x42, &CTX)
        .enter(ctx_enter)
        .exit(ctx_exit),
    CommandSpec::iowr("DRM_IOCTL_AMDGPU_BO_LIST", 0x43, &BO_LIST)
        .enter(bo_list_enter)
        .exit(bo_list_exit),
    CommandSpec::iowr("DRM_IOCTL_AMDGPU_CS", 0x44, &CS)
        .enter(cs_enter)
        .exit(out_handle),
    CommandSpec::iow("DRM_IOCTL_AMDGPU_INFO", 0x45, &INFO).enter(info),
    CommandSpec::iowr("DRM_IOCTL_AMDGPU_GEM_METADATA", 0x46, &GEM_METADATA)
        .enter(gem_metadata_enter)
        .exit(gem_metadata_exit),
    CommandSpec::iowr("DRM_IOCTL_AMDGPU_GEM_WAIT_IDLE", 0x47, &GEM_WAIT_IDLE)
        .enter(gem_wait_idle_enter)
        .exit(gem_wait_idle_exit),
    // newer headers append vm_timeline fields
    CommandSpec::iow("DRM_IOCTL_AMDGPU_GEM_VA", 0x48, &GEM_VA)
        .enter(gem_va)
        .by_nr(),
    CommandSpec::iowr("DRM_IOCTL_AMDGPU_WAIT_CS", 0x49, &WAIT_CS)
        .enter(wait_cs_enter)
        .exit(wait_cs_exit),
    CommandSpec::iowr("DRM_IOCTL_AMDGPU_GEM_OP", 0x50, &GEM_OP).enter(gem_op),
    CommandSpec::iowr("DRM_IOCTL_AMDGPU_GEM_USERPTR", 0x51, &GEM_USERPTR)
        .enter(gem_userptr_enter)
        .exit(gem_userptr_exit),
    CommandSpec::iowr("DRM_IOCTL_AMDGPU_WAIT_FENCES", 0x52, &WAIT_FENCES)
        .enter(wait_fences_enter)
        .exit(wait_fences_exit),
    CommandSpec::iowr("DRM_IOCTL_AMDGPU_VM", 0x53, &VM).enter(vm),
    CommandSpec::iowr("DRM_IOCTL_AMDGPU_FENCE_TO_HANDLE", 0x54, &FENCE_TO_HANDLE)
        .enter(fence_to_handle_enter)
        .exit(out_handle),
    CommandSpec::iow("DRM_IOCTL_AMDGPU_SCHED", 0x55, &SCHED).enter(sched),
];

#[cfg(test)]
mod tests {
    use super::super::testing::{decode, decode_on, iow, iowr, Bytes};
    use crate::memory::MemoryImage;
    use crate::session::Outcome;

    const OK: Outcome = Outcome::Success(0);

    #[test]
    fn test_gem_create_in_then_out() {
        let mut mem = MemoryImage::new();
        let create = Bytes::default().u64(4096).u64(4096).u64(0x4).u64(0x1);
        mem.map(0x1000, create.0);
        let entry = "{in={bo_size=4096, alignment=4096, domains=AMDGPU_GEM_DOMAIN_VRAM, \
                     domain_flags=AMDGPU_GEM_CREATE_CPU_ACCESS_REQUIRED}";
        assert_eq!(
            decode_on("amdgpu", &mem, iowr(0x40, 32), 0x1000, Outcome::Failure(libc::ENOMEM)),
            format!("{}}}", entry)
        );

        // the kernel reuses the bytes for `out`
        let mut done = MemoryImage::new();
        done.map(0x1000, Bytes::default().u32(5).u32(0).zeros(24).0);
        let text = decode_on("amdgpu", &done, iowr(0x40, 32), 0x1000, OK);
        assert!(text.ends_with(", out={handle=5}}"), "{}", text);
    }

    #[test]
    fn test_vendor_number_needs_driver() {
        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().zeros(32).0);
        // no driver bound: opaque pointer
        assert_eq!(decode(&mem, iowr(0x40, 32), 0x1000, OK), "0x1000");
    }

    #[test]
    fn test_ctx_alloc() {
        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().u32(1).u32(0).u32(0).i32(-512).0);
        let text = decode_on("amdgpu", &mem, iowr(0x42, 16), 0x1000, Outcome::Failure(libc::EINVAL));
        assert_eq!(
            text,
            "{in={op=AMDGPU_CTX_OP_ALLOC_CTX, flags=0, ctx_id=0, priority=AMDGPU_CTX_PRIORITY_LOW}}"
        );
    }

    #[test]
    fn test_ctx_out_follows_op() {
        // `out` overlays `in`, so alloc's ctx_id reads back the op word
        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().u32(1).u32(0).u32(0).i32(0).0);
        let text = decode_on("amdgpu", &mem, iowr(0x42, 16), 0x1000, OK);
        assert!(text.ends_with(", out={alloc={ctx_id=1}}}"), "{}", text);

        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().u32(2).u32(0).u32(9).i32(0).0);
        let text = decode_on("amdgpu", &mem, iowr(0x42, 16), 0x1000, OK);
        assert!(text.ends_with(", out={}}"), "{}", text);

        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().u32(4).u32(0).u32(9).i32(0).0);
        let text = decode_on("amdgpu", &mem, iowr(0x42, 16), 0x1000, OK);
        assert!(
            text.ends_with(
                ", out={state={flags=AMDGPU_CTX_QUERY2_FLAGS_GUILTY, hangs=9, \
                 reset_status=AMDGPU_CTX_NO_RESET}}}"
            ),
            "{}",
            text
        );
    }

    #[test]
    fn test_info_is_write_only() {
        let mut mem = MemoryImage::new();
        let info = Bytes::default().u64(0x5000).u32(8).u32(0x1).zeros(16);
        mem.map(0x1000, info.0);
        let text = decode_on("amdgpu", &mem, iow(0x45, 32), 0x1000, OK);
        assert_eq!(
            text,
            "{return_pointer=0x5000, return_size=8, query=AMDGPU_INFO_CRTC_FROM_ID}"
        );
    }

    #[test]
    fn test_metadata_set_prints_data_on_entry() {
        let mut mem = MemoryImage::new();
        let md = Bytes::default()
            .u32(3)
            .u32(2)
            .u64(0)
            .u64(0x10)
            .u32(8)
            .u32(0xaa)
            .u32(0xbb)
            .zeros(248 + 4);
        mem.map(0x1000, md.0);
        assert_eq!(
            decode_on("amdgpu", &mem, iowr(0x46, 288), 0x1000, OK),
            "{handle=3, op=AMDGPU_GEM_METADATA_OP_SET_METADATA, data={flags=0, \
             tiling_info=0x10, data_size_bytes=8, data=[0xaa, 0xbb]}}"
        );
    }

    #[test]
    fn test_metadata_get_prints_data_on_exit() {
        let mut mem = MemoryImage::new();
        let md = Bytes::default().u32(3).u32(1).u64(0).u64(0).u32(4).u32(0x7).zeros(252 + 4);
        mem.map(0x1000, md.0);
        let failed = decode_on("amdgpu", &mem, iowr(0x46, 288), 0x1000, Outcome::Failure(libc::ENOENT));
        assert!(!failed.contains("data="), "{}", failed);
        let done = decode_on("amdgpu", &mem, iowr(0x46, 288), 0x1000, OK);
        assert!(done.ends_with(", data={flags=0, tiling_info=0, data_size_bytes=4, data=[0x7]}}"), "{}", done);
    }

    #[test]
    fn test_gem_va_drifted_size() {
        let mut mem = MemoryImage::new();
        let va = Bytes::default()
            .u32(4)
            .u32(0)
            .u32(1)
            .u32(0)
            .u64(0x40_0000)
            .u64(0)
            .u64(8192)
            .zeros(24);
        mem.map(0x1000, va.0);
        let plain = decode_on("amdgpu", &mem, iow(0x48, 40), 0x1000, OK);
        let drifted = decode_on("amdgpu", &mem, iow(0x48, 64), 0x1000, OK);
        assert_eq!(plain, drifted);
        assert!(plain.contains("va_address=0x400000"), "{}", plain);
        assert!(plain.ends_with("map_size=8192}"), "{}", plain);
    }

    #[test]
    fn test_userptr_handle_after_exit() {
        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().u64(0x7000).u64(4096).u32(0).u32(11).0);
        assert_eq!(
            decode_on("amdgpu", &mem, iowr(0x51, 24), 0x1000, OK),
            "{addr=0x7000, size=4096, flags=0, handle=11}"
        );
    }

    #[test]
    fn test_fence_to_handle_nested_fence() {
        let mut mem = MemoryImage::new();
        let f = Bytes::default()
            .u32(1)
            .u32(0)
            .u32(0)
            .u32(2)
            .u64(99)
            .u32(1)
            .u32(0);
        mem.map(0x1000, f.0);
        let text = decode_on("amdgpu", &mem, iowr(0x54, 32), 0x1000, Outcome::Failure(libc::EINVAL));
        assert_eq!(
            text,
            "{in={fence={ctx_id=1, ip_type=0, ip_instance=0, ring=2, seq_no=99}, \
             what=AMDGPU_FENCE_TO_HANDLE_GET_SYNCOBJ_FD}}"
        );
    }

    #[test]
    fn test_sched_priority_signed() {
        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().u32(1).i32(5).i32(1023).u32(0).0);
        assert_eq!(
            decode_on("amdgpu", &mem, iow(0x55, 16), 0x1000, OK),
            "{in={op=AMDGPU_SCHED_OP_PROCESS_PRIORITY_OVERRIDE, fd=5, \
             priority=AMDGPU_CTX_PRIORITY_VERY_HIGH, ctx_id=0}}"
        );
    }
}
