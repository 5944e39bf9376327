//! DRM core commands with fixed-width records

use crate::decode::{DecodeCtx, Step};
use crate::personality::{Field, RecordDesc};
use crate::registry::CommandSpec;
use crate::xlat::drm as xlat;

static AUTH: RecordDesc = RecordDesc::structure("drm_auth", &[Field::u32("magic")]);

static IRQ_BUSID: RecordDesc = RecordDesc::structure(
    "drm_irq_busid",
    &[
        Field::i32("irq"),
        Field::i32("busnum"),
        Field::i32("devnum"),
        Field::i32("funcnum"),
    ],
);

static SET_VERSION: RecordDesc = RecordDesc::structure(
    "drm_set_version",
    &[
        Field::i32("drm_di_major"),
        Field::i32("drm_di_minor"),
        Field::i32("drm_dd_major"),
        Field::i32("drm_dd_minor"),
    ],
);

static MODESET_CTL: RecordDesc =
    RecordDesc::structure("drm_modeset_ctl", &[Field::u32("crtc"), Field::u32("cmd")]);

static GEM_CLOSE: RecordDesc =
    RecordDesc::structure("drm_gem_close", &[Field::u32("handle"), Field::u32("pad")]);

static GEM_FLINK: RecordDesc =
    RecordDesc::structure("drm_gem_flink", &[Field::u32("handle"), Field::u32("name")]);

static GEM_OPEN: RecordDesc = RecordDesc::structure(
    "drm_gem_open",
    &[Field::u32("name"), Field::u32("handle"), Field::u64("size")],
);

static GET_CAP: RecordDesc =
    RecordDesc::structure("drm_get_cap", &[Field::u64("capability"), Field::u64("value")]);

static SET_CLIENT_CAP: RecordDesc =
    RecordDesc::structure("drm_set_client_cap", &[Field::u64("capability"), Field::u64("value")]);

static BLOCK: RecordDesc = RecordDesc::structure("drm_block", &[Field::i32("unused")]);

static CONTROL: RecordDesc =
    RecordDesc::structure("drm_control", &[Field::u32("func"), Field::i32("irq")]);

static CTX: RecordDesc =
    RecordDesc::structure("drm_ctx", &[Field::u32("handle"), Field::u32("flags")]);

static DRAW: RecordDesc = RecordDesc::structure("drm_draw", &[Field::u32("handle")]);

static LOCK: RecordDesc =
    RecordDesc::structure("drm_lock", &[Field::i32("context"), Field::u32("flags")]);

static PRIME_HANDLE: RecordDesc = RecordDesc::structure(
    "drm_prime_handle",
    &[Field::u32("handle"), Field::u32("flags"), Field::i32("fd")],
);

static CRTC_GET_SEQUENCE: RecordDesc = RecordDesc::structure(
    "drm_crtc_get_sequence",
    &[
        Field::u32("crtc_id"),
        Field::u32("active"),
        Field::u64("sequence"),
        Field::i64("sequence_ns"),
    ],
);

static CRTC_QUEUE_SEQUENCE: RecordDesc = RecordDesc::structure(
    "drm_crtc_queue_sequence",
    &[
        Field::u32("crtc_id"),
        Field::u32("flags"),
        Field::u64("sequence"),
        Field::u64("user_data"),
    ],
);

fn magic(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| ctx.out.u(r, "magic"))
}

fn irq_busid_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.d(r, "busnum");
        ctx.out.d(r, "devnum");
        ctx.out.d(r, "funcnum");
    })
}

fn irq_busid_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.d(r, "irq"))
}

fn print_version(ctx: &mut DecodeCtx<'_>, r: &crate::record::Record) {
    ctx.out.d(r, "drm_di_major");
    ctx.out.d(r, "drm_di_minor");
    ctx.out.d(r, "drm_dd_major");
    ctx.out.d(r, "drm_dd_minor");
}

fn set_version_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(print_version)
}

fn set_version_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(print_version)
}

fn modeset_ctl(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "crtc");
        ctx.out.xval(r, "cmd", &xlat::MODESET_CMD);
    })
}

fn gem_close(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| ctx.out.u(r, "handle"))
}

fn gem_flink_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.u(r, "handle"))
}

fn gem_flink_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.u(r, "name"))
}

fn gem_open_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.u(r, "name"))
}

fn gem_open_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| {
        ctx.out.u(r, "handle");
        ctx.out.u(r, "size");
    })
}

fn get_cap_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.xval(r, "capability", &xlat::CAPABILITY))
}

fn get_cap_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.u(r, "value"))
}

fn set_client_cap(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.xval(r, "capability", &xlat::CLIENT_CAPABILITY);
        ctx.out.u(r, "value");
    })
}

fn control(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.xval(r, "func", &xlat::CONTROL_FUNC);
        ctx.out.d(r, "irq");
    })
}

fn ctx_handle(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| ctx.out.u(r, "handle"))
}

fn get_ctx(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| ctx.out.flags(r, "flags", &xlat::CTX_FLAGS))
}

fn lock(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.d(r, "context");
        ctx.out.flags(r, "flags", &xlat::LOCK_FLAGS);
    })
}

fn prime_handle_to_fd_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.u(r, "handle");
        ctx.out.flags(r, "flags", &xlat::PRIME_FLAGS);
    })
}

fn prime_handle_to_fd_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.d(r, "fd"))
}

fn prime_fd_to_handle_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.d(r, "fd"))
}

fn prime_fd_to_handle_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.u(r, "handle"))
}

fn crtc_get_sequence_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.u(r, "crtc_id"))
}

fn crtc_get_sequence_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| {
        ctx.out.u(r, "active");
        ctx.out.u(r, "sequence");
        ctx.out.d(r, "sequence_ns");
    })
}

fn crtc_queue_sequence_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| {
        ctx.out.u(r, "crtc_id");
        ctx.out.flags(r, "flags", &xlat::CRTC_SEQUENCE_FLAGS);
        ctx.out.x(r, "user_data");
        ctx.out.u(r, "sequence");
    })
}

fn crtc_queue_sequence_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(|ctx, r| ctx.out.u(r, "sequence"))
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec::ior("DRM_IOCTL_GET_MAGIC", 0x02, &AUTH).exit(magic),
    CommandSpec::iowr("DRM_IOCTL_IRQ_BUSID", 0x03, &IRQ_BUSID)
        .enter(irq_busid_enter)
        .exit(irq_busid_exit),
    CommandSpec::iowr("DRM_IOCTL_SET_VERSION", 0x07, &SET_VERSION)
        .enter(set_version_enter)
        .exit(set_version_exit),
    CommandSpec::iow("DRM_IOCTL_MODESET_CTL", 0x08, &MODESET_CTL).enter(modeset_ctl),
    CommandSpec::iow("DRM_IOCTL_GEM_CLOSE", 0x09, &GEM_CLOSE).enter(gem_close),
    CommandSpec::iowr("DRM_IOCTL_GEM_FLINK", 0x0a, &GEM_FLINK)
        .enter(gem_flink_enter)
        .exit(gem_flink_exit),
    CommandSpec::iowr("DRM_IOCTL_GEM_OPEN", 0x0b, &GEM_OPEN)
        .enter(gem_open_enter)
        .exit(gem_open_exit),
    CommandSpec::iowr("DRM_IOCTL_GET_CAP", 0x0c, &GET_CAP)
        .enter(get_cap_enter)
        .exit(get_cap_exit),
    CommandSpec::iow("DRM_IOCTL_SET_CLIENT_CAP", 0x0d, &SET_CLIENT_CAP).enter(set_client_cap),
    CommandSpec::iow("DRM_IOCTL_AUTH_MAGIC", 0x11, &AUTH).enter(magic),
    CommandSpec::iowr("DRM_IOCTL_BLOCK", 0x12, &BLOCK),
    CommandSpec::iowr("DRM_IOCTL_UNBLOCK", 0x13, &BLOCK),
    CommandSpec::iow("DRM_IOCTL_CONTROL", 0x14, &CONTROL).enter(control),
    CommandSpec::io("DRM_IOCTL_SET_MASTER", 0x1e),
    CommandSpec::io("DRM_IOCTL_DROP_MASTER", 0x1f),
    CommandSpec::iowr("DRM_IOCTL_ADD_CTX", 0x20, &CTX).exit(ctx_handle),
    CommandSpec::iowr("DRM_IOCTL_RM_CTX", 0x21, &CTX).enter(ctx_handle),
    CommandSpec::iow("DRM_IOCTL_MOD_CTX", 0x22, &CTX),
    CommandSpec::iowr("DRM_IOCTL_GET_CTX", 0x23, &CTX).exit(get_ctx),
    CommandSpec::iow("DRM_IOCTL_SWITCH_CTX", 0x24, &CTX).exit(ctx_handle),
    CommandSpec::iow("DRM_IOCTL_NEW_CTX", 0x25, &CTX).exit(ctx_handle),
    CommandSpec::iowr("DRM_IOCTL_ADD_DRAW", 0x27, &DRAW),
    CommandSpec::iowr("DRM_IOCTL_RM_DRAW", 0x28, &DRAW),
    CommandSpec::iow("DRM_IOCTL_LOCK", 0x2a, &LOCK).exit(lock),
    CommandSpec::iow("DRM_IOCTL_UNLOCK", 0x2b, &LOCK).exit(lock),
    CommandSpec::iow("DRM_IOCTL_FINISH", 0x2c, &LOCK),
    CommandSpec::iowr("DRM_IOCTL_PRIME_HANDLE_TO_FD", 0x2d, &PRIME_HANDLE)
        .enter(prime_handle_to_fd_enter)
        .exit(prime_handle_to_fd_exit),
    CommandSpec::iowr("DRM_IOCTL_PRIME_FD_TO_HANDLE", 0x2e, &PRIME_HANDLE)
        .enter(prime_fd_to_handle_enter)
        .exit(prime_fd_to_handle_exit),
    CommandSpec::io("DRM_IOCTL_AGP_ACQUIRE", 0x30),
    CommandSpec::io("DRM_IOCTL_AGP_RELEASE", 0x31),
    CommandSpec::iowr("DRM_IOCTL_CRTC_GET_SEQUENCE", 0x3b, &CRTC_GET_SEQUENCE)
        .enter(crtc_get_sequence_enter)
        .exit(crtc_get_sequence_exit),
    CommandSpec::iowr("DRM_IOCTL_CRTC_QUEUE_SEQUENCE", 0x3c, &CRTC_QUEUE_SEQUENCE)
        .enter(crtc_queue_sequence_enter)
        .exit(crtc_queue_sequence_exit),
];
