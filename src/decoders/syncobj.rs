//! Sync objects

use crate::decode::{DecodeCtx, Step};
use crate::personality::{Field, RecordDesc};
use crate::record::Record;
use crate::registry::CommandSpec;
use crate::xlat::drm as xlat;

static CREATE: RecordDesc = RecordDesc::structure(
    "drm_syncobj_create",
    &[Field::u32("handle"), Field::u32("flags")],
);

static DESTROY: RecordDesc = RecordDesc::structure(
    "drm_syncobj_destroy",
    &[Field::u32("handle"), Field::u32("pad")],
);

static HANDLE: RecordDesc = RecordDesc::structure(
    "drm_syncobj_handle",
    &[
        Field::u32("handle"),
        Field::u32("flags"),
        Field::i32("fd"),
        Field::u32("pad"),
    ],
);

static TRANSFER: RecordDesc = RecordDesc::structure(
    "drm_syncobj_transfer",
    &[
        Field::u32("src_handle"),
        Field::u32("dst_handle"),
        Field::u64("src_point"),
        Field::u64("dst_point"),
        Field::u32("flags"),
        Field::u32("pad"),
    ],
);

static WAIT: RecordDesc = RecordDesc::structure(
    "drm_syncobj_wait",
    &[
        Field::u64("handles"),
        Field::i64("timeout_nsec"),
        Field::u32("count_handles"),
        Field::u32("flags"),
        Field::u32("first_signaled"),
        Field::u32("pad"),
    ],
);

static TIMELINE_WAIT: RecordDesc = RecordDesc::structure(
    "drm_syncobj_timeline_wait",
    &[
        Field::u64("handles"),
        Field::u64("points"),
        Field::i64("timeout_nsec"),
        Field::u32("count_handles"),
        Field::u32("flags"),
        Field::u32("first_signaled"),
        Field::u32("pad"),
    ],
);

static ARRAY: RecordDesc = RecordDesc::structure(
    "drm_syncobj_array",
    &[Field::u64("handles"), Field::u32("count_handles"), Field::u32("pad")],
);

static TIMELINE_ARRAY: RecordDesc = RecordDesc::structure(
    "drm_syncobj_timeline_array",
    &[
        Field::u64("handles"),
        Field::u64("points"),
        Field::u32("count_handles"),
        Field::u32("flags"),
    ],
);

fn create_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.flags(r, "flags", &xlat::SYNCOBJ_FLAGS))
}

fn handle_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.u(r, "handle"))
}

fn destroy(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "handle");
        ctx.out.nonzero(r, "pad");
    })
}

fn handle_to_fd_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.u(r, "handle");
        ctx.out.flags(r, "flags", &xlat::SYNCOBJ_FD_FLAGS);
        ctx.out.nonzero(r, "pad");
    })
}

fn handle_to_fd_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.d(r, "fd"))
}

fn fd_to_handle_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.d(r, "fd");
        ctx.out.flags(r, "flags", &xlat::SYNCOBJ_FD_TO_HANDLE_FLAGS);
        ctx.out.nonzero(r, "pad");
    })
}

fn print_wait(ctx: &mut DecodeCtx<'_>, r: &Record, timeline: bool) {
    let count = r.get("count_handles");
    ctx.u32_array("handles", r.get("handles"), count);
    if timeline {
        ctx.u64_array("points", r.get("points"), count);
    }
    ctx.out.d(r, "timeout_nsec");
    ctx.out.u(r, "count_handles");
    ctx.out.flags(r, "flags", &xlat::SYNCOBJ_WAIT_FLAGS);
}

fn wait_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| print_wait(ctx, r, false))
}

fn timeline_wait_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| print_wait(ctx, r, true))
}

fn wait_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.u(r, "first_signaled"))
}

fn handles(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.u32_array("handles", r.get("handles"), r.get("count_handles"));
        ctx.out.u(r, "count_handles");
        ctx.out.nonzero(r, "pad");
    })
}

fn timeline_handles(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        let count = r.get("count_handles");
        ctx.u32_array("handles", r.get("handles"), count);
        ctx.u64_array("points", r.get("points"), count);
        ctx.out.u(r, "count_handles");
        ctx.out.nonzero(r, "flags");
    })
}

fn transfer(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "src_handle");
        ctx.out.u(r, "dst_handle");
        ctx.out.u(r, "src_point");
        ctx.out.u(r, "dst_point");
        ctx.out.flags(r, "flags", &xlat::SYNCOBJ_WAIT_FLAGS);
        ctx.out.nonzero(r, "pad");
    })
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec::iowr("DRM_IOCTL_SYNCOBJ_CREATE", 0xbf, &CREATE)
        .enter(create_enter)
        .exit(handle_exit),
    CommandSpec::iowr("DRM_IOCTL_SYNCOBJ_DESTROY", 0xc0, &DESTROY).enter(destroy),
    CommandSpec::iowr("DRM_IOCTL_SYNCOBJ_HANDLE_TO_FD", 0xc1, &HANDLE)
        .enter(handle_to_fd_enter)
        .exit(handle_to_fd_exit),
    CommandSpec::iowr("DRM_IOCTL_SYNCOBJ_FD_TO_HANDLE", 0xc2, &HANDLE)
        .enter(fd_to_handle_enter)
        .exit(handle_exit),
    CommandSpec::iowr("DRM_IOCTL_SYNCOBJ_WAIT", 0xc3, &WAIT)
        .enter(wait_enter)
        .exit(wait_exit)
        .by_nr(),
    CommandSpec::iowr("DRM_IOCTL_SYNCOBJ_RESET", 0xc4, &ARRAY).enter(handles),
    CommandSpec::iowr("DRM_IOCTL_SYNCOBJ_SIGNAL", 0xc5, &ARRAY).enter(handles),
    CommandSpec::iowr("DRM_IOCTL_SYNCOBJ_TIMELINE_WAIT", 0xca, &TIMELINE_WAIT)
        .enter(timeline_wait_enter)
        .exit(wait_exit)
        .by_nr(),
    CommandSpec::iowr("DRM_IOCTL_SYNCOBJ_QUERY", 0xcb, &TIMELINE_ARRAY).enter(timeline_handles),
    CommandSpec::iowr("DRM_IOCTL_SYNCOBJ_TRANSFER", 0xcc, &TRANSFER).enter(transfer),
    CommandSpec::iowr("DRM_IOCTL_SYNCOBJ_TIMELINE_SIGNAL", 0xcd, &TIMELINE_ARRAY)
        .enter(timeline_handles),
];

#[cfg(test)]
mod tests {
    use super::super::testing::{decode, iowr, Bytes};
    use crate::memory::MemoryImage;
    use crate::session::Outcome;

    const OK: Outcome = Outcome::Success(0);

    #[test]
    fn test_create_handle_after_exit() {
        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().u32(7).u32(1).0);
        assert_eq!(
            decode(&mem, iowr(0xbf, 8), 0x1000, OK),
            "{flags=SYNCOBJ_CREATE_SIGNALED, handle=7}"
        );
        assert_eq!(
            decode(&mem, iowr(0xbf, 8), 0x1000, Outcome::Failure(libc::EINVAL)),
            "{flags=SYNCOBJ_CREATE_SIGNALED}"
        );
    }

    #[test]
    fn test_destroy_pad_only_when_set() {
        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().u32(7).u32(0).0);
        mem.map(0x2000, Bytes::default().u32(7).u32(3).0);
        assert_eq!(decode(&mem, iowr(0xc0, 8), 0x1000, OK), "{handle=7}");
        assert_eq!(decode(&mem, iowr(0xc0, 8), 0x2000, OK), "{handle=7, pad=3}");
    }

    #[test]
    fn test_handle_fd_directions() {
        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().u32(7).u32(0).i32(12).u32(0).0);
        assert_eq!(decode(&mem, iowr(0xc1, 16), 0x1000, OK), "{handle=7, flags=0, fd=12}");
        assert_eq!(decode(&mem, iowr(0xc2, 16), 0x1000, OK), "{fd=12, flags=0, handle=7}");
    }

    #[test]
    fn test_wait_matches_any_size() {
        let mut mem = MemoryImage::new();
        let wait = Bytes::default()
            .u64(0x2000)
            .i64(-1)
            .u32(2)
            .u32(0x1)
            .u32(1)
            .u32(0)
            .u64(0);
        mem.map(0x1000, wait.0);
        mem.map(0x2000, Bytes::default().u32(7).u32(8).0);
        let expected = "{handles=[7, 8], timeout_nsec=-1, count_handles=2, \
                        flags=SYNCOBJ_WAIT_FLAGS_WAIT_ALL, first_signaled=1}";
        assert_eq!(decode(&mem, iowr(0xc3, 32), 0x1000, OK), expected);
        // newer headers append a deadline
        assert_eq!(decode(&mem, iowr(0xc3, 40), 0x1000, OK), expected);
    }

    #[test]
    fn test_query_points() {
        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().u64(0x2000).u64(0x3000).u32(1).u32(0).0);
        mem.map(0x2000, Bytes::default().u32(7).0);
        mem.map(0x3000, Bytes::default().u64(42).0);
        assert_eq!(
            decode(&mem, iowr(0xcb, 24), 0x1000, OK),
            "{handles=[7], points=[42], count_handles=1}"
        );
    }

    #[test]
    fn test_reset_null_handles() {
        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().u64(0).u32(3).u32(0).0);
        assert_eq!(
            decode(&mem, iowr(0xc4, 16), 0x1000, OK),
            "{handles=NULL, count_handles=3}"
        );
    }

    #[test]
    fn test_transfer() {
        let mut mem = MemoryImage::new();
        let t = Bytes::default().u32(1).u32(2).u64(10).u64(0).u32(0).u32(0);
        mem.map(0x1000, t.0);
        assert_eq!(
            decode(&mem, iowr(0xcc, 32), 0x1000, OK),
            "{src_handle=1, dst_handle=2, src_point=10, dst_point=0, flags=0}"
        );
    }
}
