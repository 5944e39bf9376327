//! Commands whose records hold `long`s or pointers
//!
//! The layouts here change between 64-bit and 32-bit tracees, so each
//! record is laid out once per ABI by the registry. A few KMS records are
//! also kept here: their size drifted across header versions and they are
//! matched by command number.

use crate::decode::{DecodeCtx, Step};
use crate::personality::{Field, RecordDesc, Scalar};
use crate::record::Record;
use crate::registry::CommandSpec;
use crate::render::Render;
use crate::xlat::drm as xlat;
use crate::xlat::{render_enum, render_flags};

/// Inline `drm_stats.data` entries.
const STATS_SLOTS: usize = 15;

static VERSION: RecordDesc = RecordDesc::structure(
    "drm_version",
    &[
        Field::i32("version_major"),
        Field::i32("version_minor"),
        Field::i32("version_patchlevel"),
        Field::ulong("name_len"),
        Field::ptr("name"),
        Field::ulong("date_len"),
        Field::ptr("date"),
        Field::ulong("desc_len"),
        Field::ptr("desc"),
    ],
);

static UNIQUE: RecordDesc = RecordDesc::structure(
    "drm_unique",
    &[Field::ulong("unique_len"), Field::ptr("unique")],
);

static MAP: RecordDesc = RecordDesc::structure(
    "drm_map",
    &[
        Field::ulong("offset"),
        Field::ulong("size"),
        Field::u32("type"),
        Field::u32("flags"),
        Field::ptr("handle"),
        Field::i32("mtrr"),
    ],
);

static CLIENT: RecordDesc = RecordDesc::structure(
    "drm_client",
    &[
        Field::i32("idx"),
        Field::i32("auth"),
        Field::ulong("pid"),
        Field::ulong("uid"),
        Field::ulong("magic"),
        Field::ulong("iocs"),
    ],
);

static STAT_ENTRY: RecordDesc = RecordDesc::structure(
    "drm_stats_data",
    &[Field::ulong("value"), Field::u32("type")],
);

static STATS: RecordDesc = RecordDesc::structure(
    "drm_stats",
    &[
        Field::ulong("count"),
        Field::records("data", &STAT_ENTRY, STATS_SLOTS),
    ],
);

static BUF_DESC: RecordDesc = RecordDesc::structure(
    "drm_buf_desc",
    &[
        Field::i32("count"),
        Field::i32("size"),
        Field::i32("low_mark"),
        Field::i32("high_mark"),
        Field::u32("flags"),
        Field::ulong("agp_start"),
    ],
);

static BUF_INFO: RecordDesc =
    RecordDesc::structure("drm_buf_info", &[Field::i32("count"), Field::ptr("list")]);

static BUF_MAP: RecordDesc = RecordDesc::structure(
    "drm_buf_map",
    &[Field::i32("count"), Field::ptr("virtual"), Field::ptr("list")],
);

static BUF_FREE: RecordDesc =
    RecordDesc::structure("drm_buf_free", &[Field::i32("count"), Field::ptr("list")]);

static CTX_PRIV_MAP: RecordDesc = RecordDesc::structure(
    "drm_ctx_priv_map",
    &[Field::u32("ctx_id"), Field::ptr("handle")],
);

static CTX_RES: RecordDesc =
    RecordDesc::structure("drm_ctx_res", &[Field::i32("count"), Field::ptr("contexts")]);

static AGP_MODE: RecordDesc = RecordDesc::structure("drm_agp_mode", &[Field::ulong("mode")]);

static AGP_BUFFER: RecordDesc = RecordDesc::structure(
    "drm_agp_buffer",
    &[
        Field::ulong("size"),
        Field::ulong("handle"),
        Field::ulong("type"),
        Field::ulong("physical"),
    ],
);

static AGP_BINDING: RecordDesc = RecordDesc::structure(
    "drm_agp_binding",
    &[Field::ulong("handle"), Field::ulong("offset")],
);

static AGP_INFO: RecordDesc = RecordDesc::structure(
    "drm_agp_info",
    &[
        Field::i32("agp_version_major"),
        Field::i32("agp_version_minor"),
        Field::ulong("mode"),
        Field::ulong("aperture_base"),
        Field::ulong("aperture_size"),
        Field::ulong("memory_allowed"),
        Field::ulong("memory_used"),
        Field::u16("id_vendor"),
        Field::u16("id_device"),
    ],
);

static SCATTER_GATHER: RecordDesc = RecordDesc::structure(
    "drm_scatter_gather",
    &[Field::ulong("size"), Field::ulong("handle")],
);

static VBLANK_REQUEST: RecordDesc = RecordDesc::structure(
    "drm_wait_vblank_request",
    &[Field::u32("type"), Field::u32("sequence"), Field::ulong("signal")],
);

static VBLANK_REPLY: RecordDesc = RecordDesc::structure(
    "drm_wait_vblank_reply",
    &[
        Field::u32("type"),
        Field::u32("sequence"),
        Field::long("tval_sec"),
        Field::long("tval_usec"),
    ],
);

static WAIT_VBLANK: RecordDesc = RecordDesc::union(
    "drm_wait_vblank",
    &[
        Field::record("request", &VBLANK_REQUEST),
        Field::record("reply", &VBLANK_REPLY),
    ],
);

static GET_CONNECTOR: RecordDesc = RecordDesc::structure(
    "drm_mode_get_connector",
    &[
        Field::u64("encoders_ptr"),
        Field::u64("modes_ptr"),
        Field::u64("props_ptr"),
        Field::u64("prop_values_ptr"),
        Field::u32("count_modes"),
        Field::u32("count_props"),
        Field::u32("count_encoders"),
        Field::u32("encoder_id"),
        Field::u32("connector_id"),
        Field::u32("connector_type"),
        Field::u32("connector_type_id"),
        Field::u32("connection"),
        Field::u32("mm_width"),
        Field::u32("mm_height"),
        Field::u32("subpixel"),
        Field::u32("pad"),
    ],
);

static FB_CMD2: RecordDesc = RecordDesc::structure(
    "drm_mode_fb_cmd2",
    &[
        Field::u32("fb_id"),
        Field::u32("width"),
        Field::u32("height"),
        Field::u32("pixel_format"),
        Field::u32("flags"),
        Field::array("handles", Scalar::U32, 4),
        Field::array("pitches", Scalar::U32, 4),
        Field::array("offsets", Scalar::U32, 4),
        Field::array("modifier", Scalar::U64, 4),
    ],
);

static GET_PLANE_RES: RecordDesc = RecordDesc::structure(
    "drm_mode_get_plane_res",
    &[Field::u64("plane_id_ptr"), Field::u32("count_planes")],
);

static OBJ_GET_PROPERTIES: RecordDesc = RecordDesc::structure(
    "drm_mode_obj_get_properties",
    &[
        Field::u64("props_ptr"),
        Field::u64("prop_values_ptr"),
        Field::u32("count_props"),
        Field::u32("obj_id"),
        Field::u32("obj_type"),
    ],
);

static OBJ_SET_PROPERTY: RecordDesc = RecordDesc::structure(
    "drm_mode_obj_set_property",
    &[
        Field::u64("value"),
        Field::u32("prop_id"),
        Field::u32("obj_id"),
        Field::u32("obj_type"),
    ],
);

fn version_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| {
        ctx.out.u(r, "name_len");
        ctx.out.u(r, "date_len");
        ctx.out.u(r, "desc_len");
    })
}

fn version_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(|ctx, r| {
        ctx.out.d(r, "version_major");
        ctx.out.d(r, "version_minor");
        ctx.out.d(r, "version_patchlevel");
        for (len, text) in [("name_len", "name"), ("date_len", "date"), ("desc_len", "desc")] {
            ctx.out.u(r, len);
            ctx.string(text, r.get(text), r.get(len));
        }
    })
}

fn get_unique_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| ctx.out.u(r, "unique_len"))
}

fn print_unique(ctx: &mut DecodeCtx<'_>, r: &Record) {
    ctx.out.u(r, "unique_len");
    ctx.string("unique", r.get("unique"), r.get("unique_len"));
}

fn get_unique_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(print_unique)
}

fn set_unique(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(print_unique)
}

fn print_map_kind(out: &mut Render, r: &Record) {
    out.xval(r, "type", &xlat::MAP_TYPE);
    out.flags(r, "flags", &xlat::MAP_FLAGS);
}

fn get_map_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| ctx.out.x(r, "offset"))
}

fn get_map_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(|ctx, r| {
        ctx.out.x(r, "offset");
        ctx.out.u(r, "size");
        print_map_kind(ctx.out, r);
        ctx.out.ptr(r, "handle");
        ctx.out.d(r, "mtrr");
    })
}

fn add_map(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.x(r, "offset");
        ctx.out.u(r, "size");
        print_map_kind(ctx.out, r);
    })
}

fn rm_map(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| ctx.out.ptr(r, "handle"))
}

fn get_client_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.d(r, "idx"))
}

fn get_client_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| {
        ctx.out.d(r, "auth");
        for field in ["pid", "uid", "magic", "iocs"] {
            ctx.out.u(r, field);
        }
    })
}

/// Only the first `count` slots carry data.
fn get_stats(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "count");
        let filled = (r.get("count") as usize).min(STATS_SLOTS);
        ctx.out.label("data");
        ctx.out.open_array();
        for entry in (0..filled).filter_map(|i| r.sub_at("data", i)) {
            ctx.out.item();
            ctx.out.open();
            ctx.out.u(&entry, "value");
            ctx.out.xval(&entry, "type", &xlat::STAT_TYPE);
            ctx.out.close();
        }
        ctx.out.close();
    })
}

fn add_bufs_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| {
        ctx.out.d(r, "count");
        ctx.out.d(r, "size");
        ctx.out.flags(r, "flags", &xlat::BUF_DESC_FLAGS);
        ctx.out.x(r, "agp_start");
    })
}

fn add_bufs_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(|ctx, r| {
        ctx.out.d(r, "count");
        ctx.out.d(r, "size");
    })
}

fn mark_bufs(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.d(r, "size");
        ctx.out.d(r, "low_mark");
        ctx.out.d(r, "high_mark");
    })
}

fn info_bufs_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| {
        ctx.out.ptr(r, "list");
        ctx.out.d(r, "count");
    })
}

fn info_bufs_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(|ctx, r| ctx.out.d(r, "count"))
}

fn map_bufs_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.d(r, "count");
        ctx.out.ptr(r, "virtual");
    })
}

fn map_bufs_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.ptr(r, "list"))
}

fn free_bufs(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.d(r, "count");
        let count = r.get_signed("count").max(0) as u64;
        ctx.i32_array("list", r.get("list"), count);
    })
}

fn set_sarea_ctx(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "ctx_id");
        ctx.out.ptr(r, "handle");
    })
}

fn get_sarea_ctx_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.u(r, "ctx_id"))
}

fn get_sarea_ctx_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.ptr(r, "handle"))
}

fn res_ctx_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| ctx.out.d(r, "count"))
}

fn res_ctx_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(|ctx, r| {
        ctx.out.d(r, "count");
        ctx.out.ptr(r, "contexts");
    })
}

fn agp_enable(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| ctx.out.x(r, "mode"))
}

fn agp_info(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.d(r, "agp_version_major");
        ctx.out.d(r, "agp_version_minor");
        ctx.out.x(r, "mode");
        ctx.out.x(r, "aperture_base");
        for field in ["aperture_size", "memory_allowed", "memory_used"] {
            ctx.out.u(r, field);
        }
        ctx.out.x(r, "id_vendor");
        ctx.out.x(r, "id_device");
    })
}

fn agp_alloc_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.u(r, "size");
        ctx.out.u(r, "type");
    })
}

fn agp_alloc_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| {
        ctx.out.u(r, "handle");
        ctx.out.x(r, "physical");
    })
}

fn agp_handle(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| ctx.out.u(r, "handle"))
}

fn agp_bind(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "handle");
        ctx.out.x(r, "offset");
    })
}

fn sg_alloc_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.u(r, "size"))
}

fn sg_alloc_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.u(r, "handle"))
}

fn sg_free(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| ctx.out.u(r, "handle"))
}

/// Sequence type in the low bits, modifier flags above.
fn vblank_type(value: u64) -> String {
    let kind = render_enum(&xlat::VBLANK_SEQ_TYPE, value & xlat::VBLANK_TYPES_MASK);
    match value & !xlat::VBLANK_TYPES_MASK {
        0 => kind,
        rest => format!("{}|{}", kind, render_flags(&xlat::VBLANK_SEQ_FLAGS, rest)),
    }
}

fn wait_vblank_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.open_field("request");
        ctx.out.value("type", vblank_type(r.get("request.type")));
        ctx.out.u(r, "request.sequence");
        ctx.out.u(r, "request.signal");
        ctx.out.close();
    })
}

fn wait_vblank_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| {
        ctx.out.open_field("reply");
        ctx.out.value("type", vblank_type(r.get("reply.type")));
        ctx.out.u(r, "reply.sequence");
        ctx.out.d(r, "reply.tval_sec");
        ctx.out.d(r, "reply.tval_usec");
        ctx.out.close();
    })
}

fn get_connector_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| {
        ctx.out.u(r, "connector_id");
        ctx.out.u(r, "count_encoders");
    })
}

fn get_connector_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(|ctx, r| {
        ctx.out.u(r, "connector_id");
        ctx.out.u(r, "count_encoders");
        for field in ["encoders_ptr", "modes_ptr", "props_ptr", "prop_values_ptr"] {
            ctx.out.ptr(r, field);
        }
        for field in [
            "count_modes",
            "count_props",
            "encoder_id",
            "connector_type",
            "connector_type_id",
        ] {
            ctx.out.u(r, field);
        }
        ctx.out.xval(r, "connection", &xlat::CONNECTION);
        ctx.out.u(r, "mm_width");
        ctx.out.u(r, "mm_height");
        ctx.out.u(r, "subpixel");
    })
}

fn add_fb2_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.u(r, "width");
        ctx.out.u(r, "height");
        ctx.out.x(r, "pixel_format");
        ctx.out.flags(r, "flags", &xlat::ADDFB2_FLAGS);
        for plane in ["handles", "pitches", "offsets", "modifier"] {
            ctx.out.inline(r, plane, 4);
        }
    })
}

fn add_fb2_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.u(r, "fb_id"))
}

fn get_plane_res_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| {
        ctx.out.ptr(r, "plane_id_ptr");
        ctx.out.u(r, "count_planes");
    })
}

fn get_plane_res_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(|ctx, r| ctx.out.u(r, "count_planes"))
}

fn obj_get_properties_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.ptr(r, "props_ptr");
        ctx.out.ptr(r, "prop_values_ptr");
        ctx.out.u(r, "obj_id");
        ctx.out.x(r, "obj_type");
    })
}

fn obj_get_properties_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.u(r, "count_props"))
}

fn obj_set_property(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "value");
        ctx.out.u(r, "prop_id");
        ctx.out.u(r, "obj_id");
        ctx.out.x(r, "obj_type");
    })
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec::iowr("DRM_IOCTL_VERSION", 0x00, &VERSION)
        .enter(version_enter)
        .exit(version_exit),
    CommandSpec::iowr("DRM_IOCTL_GET_UNIQUE", 0x01, &UNIQUE)
        .enter(get_unique_enter)
        .exit(get_unique_exit),
    CommandSpec::iowr("DRM_IOCTL_GET_MAP", 0x04, &MAP)
        .enter(get_map_enter)
        .exit(get_map_exit),
    CommandSpec::iowr("DRM_IOCTL_GET_CLIENT", 0x05, &CLIENT)
        .enter(get_client_enter)
        .exit(get_client_exit),
    CommandSpec::ior("DRM_IOCTL_GET_STATS", 0x06, &STATS).exit(get_stats),
    CommandSpec::iow("DRM_IOCTL_SET_UNIQUE", 0x10, &UNIQUE).enter(set_unique),
    CommandSpec::iowr("DRM_IOCTL_ADD_MAP", 0x15, &MAP).enter(add_map),
    CommandSpec::iowr("DRM_IOCTL_ADD_BUFS", 0x16, &BUF_DESC)
        .enter(add_bufs_enter)
        .exit(add_bufs_exit),
    CommandSpec::iow("DRM_IOCTL_MARK_BUFS", 0x17, &BUF_DESC).enter(mark_bufs),
    CommandSpec::iowr("DRM_IOCTL_INFO_BUFS", 0x18, &BUF_INFO)
        .enter(info_bufs_enter)
        .exit(info_bufs_exit),
    CommandSpec::iowr("DRM_IOCTL_MAP_BUFS", 0x19, &BUF_MAP)
        .enter(map_bufs_enter)
        .exit(map_bufs_exit),
    CommandSpec::iow("DRM_IOCTL_FREE_BUFS", 0x1a, &BUF_FREE).enter(free_bufs),
    CommandSpec::iow("DRM_IOCTL_RM_MAP", 0x1b, &MAP).enter(rm_map),
    CommandSpec::iow("DRM_IOCTL_SET_SAREA_CTX", 0x1c, &CTX_PRIV_MAP).enter(set_sarea_ctx),
    CommandSpec::iowr("DRM_IOCTL_GET_SAREA_CTX", 0x1d, &CTX_PRIV_MAP)
        .enter(get_sarea_ctx_enter)
        .exit(get_sarea_ctx_exit),
    CommandSpec::iowr("DRM_IOCTL_RES_CTX", 0x26, &CTX_RES)
        .enter(res_ctx_enter)
        .exit(res_ctx_exit),
    CommandSpec::iow("DRM_IOCTL_AGP_ENABLE", 0x32, &AGP_MODE).enter(agp_enable),
    CommandSpec::ior("DRM_IOCTL_AGP_INFO", 0x33, &AGP_INFO).exit(agp_info),
    CommandSpec::iowr("DRM_IOCTL_AGP_ALLOC", 0x34, &AGP_BUFFER)
        .enter(agp_alloc_enter)
        .exit(agp_alloc_exit),
    CommandSpec::iow("DRM_IOCTL_AGP_FREE", 0x35, &AGP_BUFFER).enter(agp_handle),
    CommandSpec::iow("DRM_IOCTL_AGP_BIND", 0x36, &AGP_BINDING).enter(agp_bind),
    CommandSpec::iow("DRM_IOCTL_AGP_UNBIND", 0x37, &AGP_BINDING).enter(agp_handle),
    CommandSpec::iowr("DRM_IOCTL_SG_ALLOC", 0x38, &SCATTER_GATHER)
        .enter(sg_alloc_enter)
        .exit(sg_alloc_exit),
    CommandSpec::iow("DRM_IOCTL_SG_FREE", 0x39, &SCATTER_GATHER).enter(sg_free),
    CommandSpec::iowr("DRM_IOCTL_WAIT_VBLANK", 0x3a, &WAIT_VBLANK)
        .enter(wait_vblank_enter)
        .exit(wait_vblank_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_GETCONNECTOR", 0xa7, &GET_CONNECTOR)
        .enter(get_connector_enter)
        .exit(get_connector_exit)
        .by_nr(),
    CommandSpec::iowr("DRM_IOCTL_MODE_GETPLANERESOURCES", 0xb5, &GET_PLANE_RES)
        .enter(get_plane_res_enter)
        .exit(get_plane_res_exit)
        .by_nr(),
    CommandSpec::iowr("DRM_IOCTL_MODE_ADDFB2", 0xb8, &FB_CMD2)
        .enter(add_fb2_enter)
        .exit(add_fb2_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_OBJ_GETPROPERTIES", 0xb9, &OBJ_GET_PROPERTIES)
        .enter(obj_get_properties_enter)
        .exit(obj_get_properties_exit)
        .by_nr(),
    CommandSpec::iowr("DRM_IOCTL_MODE_OBJ_SETPROPERTY", 0xba, &OBJ_SET_PROPERTY)
        .enter(obj_set_property)
        .by_nr(),
];
