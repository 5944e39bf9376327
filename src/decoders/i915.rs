//! i915 driver commands

use crate::decode::{DecodeCtx, Step};
use crate::personality::{Field, RecordDesc, Scalar};
use crate::registry::CommandSpec;
use crate::session::Stash;
use crate::xlat::i915 as xlat;

use super::mode::{print_clip_rect, CLIP_RECT};

static INIT: RecordDesc = RecordDesc::structure(
    "drm_i915_init",
    &[
        Field::u32("func"),
        Field::u32("mmio_offset"),
        Field::i32("sarea_priv_offset"),
        Field::u32("ring_start"),
        Field::u32("ring_end"),
        Field::u32("ring_size"),
        Field::u32("front_offset"),
        Field::u32("back_offset"),
        Field::u32("depth_offset"),
        Field::u32("w"),
        Field::u32("h"),
        Field::u32("pitch"),
        Field::u32("pitch_bits"),
        Field::u32("back_pitch"),
        Field::u32("depth_pitch"),
        Field::u32("cpp"),
        Field::u32("chipset"),
    ],
);

static BATCHBUFFER: RecordDesc = RecordDesc::structure(
    "drm_i915_batchbuffer",
    &[
        Field::i32("start"),
        Field::i32("used"),
        Field::i32("DR1"),
        Field::i32("DR4"),
        Field::i32("num_cliprects"),
        Field::ptr("cliprects"),
    ],
);

static GETPARAM: RecordDesc = RecordDesc::structure(
    "drm_i915_getparam",
    &[Field::i32("param"), Field::ptr("value")],
);

static SETPARAM: RecordDesc = RecordDesc::structure(
    "drm_i915_setparam",
    &[Field::i32("param"), Field::i32("value")],
);

static EXECBUFFER2: RecordDesc = RecordDesc::structure(
    "drm_i915_gem_execbuffer2",
    &[
        Field::u64("buffers_ptr"),
        Field::u32("buffer_count"),
        Field::u32("batch_start_offset"),
        Field::u32("batch_len"),
        Field::u32("DR1"),
        Field::u32("DR4"),
        Field::u32("num_cliprects"),
        Field::u64("cliprects_ptr"),
        Field::u64("flags"),
        Field::u64("rsvd1"),
        Field::u64("rsvd2"),
    ],
);

static BUSY: RecordDesc = RecordDesc::structure(
    "drm_i915_gem_busy",
    &[Field::u32("handle"), Field::u32("busy")],
);

static CREATE: RecordDesc = RecordDesc::structure(
    "drm_i915_gem_create",
    &[Field::u64("size"), Field::u32("handle"), Field::u32("pad")],
);

static PREAD: RecordDesc = RecordDesc::structure(
    "drm_i915_gem_pread",
    &[
        Field::u32("handle"),
        Field::u32("pad"),
        Field::u64("offset"),
        Field::u64("size"),
        Field::u64("data_ptr"),
    ],
);

static PWRITE: RecordDesc = RecordDesc::structure(
    "drm_i915_gem_pwrite",
    &[
        Field::u32("handle"),
        Field::u32("pad"),
        Field::u64("offset"),
        Field::u64("size"),
        Field::u64("data_ptr"),
    ],
);

static MMAP: RecordDesc = RecordDesc::structure(
    "drm_i915_gem_mmap",
    &[
        Field::u32("handle"),
        Field::u32("pad"),
        Field::u64("offset"),
        Field::u64("size"),
        Field::u64("addr_ptr"),
        Field::u64("flags"),
    ],
);

static MMAP_GTT: RecordDesc = RecordDesc::structure(
    "drm_i915_gem_mmap_gtt",
    &[Field::u32("handle"), Field::u32("pad"), Field::u64("offset")],
);

static SET_DOMAIN: RecordDesc = RecordDesc::structure(
    "drm_i915_gem_set_domain",
    &[
        Field::u32("handle"),
        Field::u32("read_domains"),
        Field::u32("write_domain"),
    ],
);

static SET_TILING: RecordDesc = RecordDesc::structure(
    "drm_i915_gem_set_tiling",
    &[
        Field::u32("handle"),
        Field::u32("tiling_mode"),
        Field::u32("stride"),
        Field::u32("swizzle_mode"),
    ],
);

static GET_TILING: RecordDesc = RecordDesc::structure(
    "drm_i915_gem_get_tiling",
    &[
        Field::u32("handle"),
        Field::u32("tiling_mode"),
        Field::u32("swizzle_mode"),
        Field::u32("phys_swizzle_mode"),
    ],
);

static MADVISE: RecordDesc = RecordDesc::structure(
    "drm_i915_gem_madvise",
    &[Field::u32("handle"), Field::u32("madv"), Field::u32("retained")],
);

static USERPTR: RecordDesc = RecordDesc::structure(
    "drm_i915_gem_userptr",
    &[
        Field::u64("user_ptr"),
        Field::u64("user_size"),
        Field::u32("flags"),
        Field::u32("handle"),
    ],
);

fn init(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.x(r, "func");
        ctx.out.x(r, "mmio_offset");
        ctx.out.d(r, "sarea_priv_offset");
        ctx.out.u(r, "ring_start");
        ctx.out.u(r, "ring_end");
        ctx.out.u(r, "ring_size");
        ctx.out.x(r, "front_offset");
        ctx.out.x(r, "back_offset");
        ctx.out.x(r, "depth_offset");
        for path in ["w", "h", "pitch", "pitch_bits", "back_pitch", "depth_pitch", "cpp", "chipset"] {
            ctx.out.u(r, path);
        }
    })
}

fn batchbuffer(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.d(r, "start");
        ctx.out.d(r, "used");
        ctx.out.d(r, "DR1");
        ctx.out.d(r, "DR4");
        ctx.out.d(r, "num_cliprects");
        // a negative count reads nothing
        let count = u64::try_from(r.get_signed("num_cliprects")).unwrap_or(0);
        ctx.record_array("cliprects", r.get("cliprects"), count, &CLIP_RECT, print_clip_rect);
    })
}

fn getparam_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.stash(Stash::I915Param(r.get_symbolic("param")));
        ctx.out.xval(r, "param", &xlat::GETPARAMS);
    })
}

fn getparam_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    let param = match ctx.take_stash() {
        Some(Stash::I915Param(param)) => param,
        _ => return ctx.finish(|_, _| {}),
    };
    ctx.finish(|ctx, r| {
        let Some(value) = ctx.read_scalar(r.get("value"), Scalar::I32) else {
            return;
        };
        let value = value as u32;
        if param == xlat::PARAM_CHIPSET_ID {
            ctx.out.value("value", format_args!("{:#06x}", value));
        } else {
            ctx.out.value("value", value as i32);
        }
    })
}

fn setparam(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.xval(r, "param", &xlat::SETPARAMS);
        ctx.out.d(r, "value");
    })
}

fn execbuffer2(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.ptr(r, "buffers_ptr");
        ctx.out.u(r, "buffer_count");
        ctx.out.x(r, "batch_start_offset");
        ctx.out.u(r, "batch_len");
        ctx.out.u(r, "DR1");
        ctx.out.u(r, "DR4");
        ctx.out.u(r, "num_cliprects");
        ctx.out.ptr(r, "cliprects_ptr");
        ctx.out.x(r, "flags");
    })
}

fn handle_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.u(r, "handle"))
}

fn busy_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| {
        let busy = r.get("busy");
        ctx.out.value("busy", if busy & 1 != 0 { 'Y' } else { 'N' });
        ctx.out.value("ring", busy >> 16);
    })
}

fn create_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.u(r, "size"))
}

fn handle_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.u(r, "handle"))
}

fn transfer(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "handle");
        ctx.out.u(r, "offset");
        ctx.out.u(r, "size");
        ctx.out.ptr(r, "data_ptr");
    })
}

fn mmap_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.u(r, "handle");
        ctx.out.u(r, "size");
    })
}

fn mmap_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| {
        ctx.out.u(r, "offset");
        ctx.out.ptr(r, "addr_ptr");
    })
}

fn offset_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.u(r, "offset"))
}

fn set_domain(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "handle");
        ctx.out.flags(r, "read_domains", &xlat::GEM_DOMAINS);
        ctx.out.flags(r, "write_domain", &xlat::GEM_DOMAINS);
    })
}

fn madvise_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.u(r, "handle");
        ctx.out.xval(r, "madv", &xlat::MADVISE);
    })
}

fn madvise_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.u(r, "retained"))
}

fn get_tiling_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| {
        ctx.out.xval(r, "tiling_mode", &xlat::TILING_MODES);
        ctx.out.xval(r, "swizzle_mode", &xlat::SWIZZLE_MODES);
    })
}

fn set_tiling_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.u(r, "handle");
        ctx.out.xval(r, "tiling_mode", &xlat::TILING_MODES);
        ctx.out.u(r, "stride");
    })
}

fn set_tiling_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.xval(r, "swizzle_mode", &xlat::SWIZZLE_MODES))
}

fn userptr_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.ptr(r, "user_ptr");
        ctx.out.u(r, "user_size");
    })
}

fn userptr_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| {
        ctx.out.flags(r, "flags", &xlat::USERPTR_FLAGS);
        ctx.out.u(r, "handle");
    })
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec::iow("DRM_IOCTL_I915_INIT", 0x40, &INIT).enter(init),
    CommandSpec::iow("DRM_IOCTL_I915_BATCHBUFFER", 0x43, &BATCHBUFFER).enter(batchbuffer),
    CommandSpec::iowr("DRM_IOCTL_I915_GETPARAM", 0x46, &GETPARAM)
        .enter(getparam_enter)
        .exit(getparam_exit),
    CommandSpec::iow("DRM_IOCTL_I915_SETPARAM", 0x47, &SETPARAM).enter(setparam),
    CommandSpec::iowr("DRM_IOCTL_I915_GEM_BUSY", 0x57, &BUSY)
        .enter(handle_enter)
        .exit(busy_exit),
    CommandSpec::iowr("DRM_IOCTL_I915_GEM_CREATE", 0x5b, &CREATE)
        .enter(create_enter)
        .exit(handle_exit),
    CommandSpec::iow("DRM_IOCTL_I915_GEM_PREAD", 0x5c, &PREAD).enter(transfer),
    CommandSpec::iow("DRM_IOCTL_I915_GEM_PWRITE", 0x5d, &PWRITE).enter(transfer),
    // grew a flags field in later headers
    CommandSpec::iowr("DRM_IOCTL_I915_GEM_MMAP", 0x5e, &MMAP)
        .enter(mmap_enter)
        .exit(mmap_exit)
        .by_nr(),
    CommandSpec::iow("DRM_IOCTL_I915_GEM_SET_DOMAIN", 0x5f, &SET_DOMAIN).enter(set_domain),
    CommandSpec::iowr("DRM_IOCTL_I915_GEM_SET_TILING", 0x61, &SET_TILING)
        .enter(set_tiling_enter)
        .exit(set_tiling_exit),
    CommandSpec::iowr("DRM_IOCTL_I915_GEM_GET_TILING", 0x62, &GET_TILING)
        .enter(handle_enter)
        .exit(get_tiling_exit),
    CommandSpec::iowr("DRM_IOCTL_I915_GEM_MMAP_GTT", 0x64, &MMAP_GTT)
        .enter(handle_enter)
        .exit(offset_exit),
    CommandSpec::iowr("DRM_IOCTL_I915_GEM_MADVISE", 0x66, &MADVISE)
        .enter(madvise_enter)
        .exit(madvise_exit),
    CommandSpec::iow("DRM_IOCTL_I915_GEM_EXECBUFFER2", 0x69, &EXECBUFFER2).enter(execbuffer2),
    CommandSpec::iowr("DRM_IOCTL_I915_GEM_USERPTR", 0x73, &USERPTR)
        .enter(userptr_enter)
        .exit(userptr_exit),
];
