//! Kernel mode setting: resources, CRTCs, planes, properties, framebuffers,
//! dumb buffers, atomic commits and leases

use crate::decode::{DecodeCtx, Step};
use crate::personality::{Field, RecordDesc};
use crate::record::Record;
use crate::registry::CommandSpec;
use crate::render::Render;
use crate::xlat::drm as xlat;

pub(crate) static MODEINFO: RecordDesc = RecordDesc::structure(
    "drm_mode_modeinfo",
    &[
        Field::u32("clock"),
        Field::u16("hdisplay"),
        Field::u16("hsync_start"),
        Field::u16("hsync_end"),
        Field::u16("htotal"),
        Field::u16("hskew"),
        Field::u16("vdisplay"),
        Field::u16("vsync_start"),
        Field::u16("vsync_end"),
        Field::u16("vtotal"),
        Field::u16("vscan"),
        Field::u32("vrefresh"),
        Field::u32("flags"),
        Field::u32("type"),
        Field::bytes("name", 32),
    ],
);

static CARD_RES: RecordDesc = RecordDesc::structure(
    "drm_mode_card_res",
    &[
        Field::u64("fb_id_ptr"),
        Field::u64("crtc_id_ptr"),
        Field::u64("connector_id_ptr"),
        Field::u64("encoder_id_ptr"),
        Field::u32("count_fbs"),
        Field::u32("count_crtcs"),
        Field::u32("count_connectors"),
        Field::u32("count_encoders"),
        Field::u32("min_width"),
        Field::u32("max_width"),
        Field::u32("min_height"),
        Field::u32("max_height"),
    ],
);

static CRTC: RecordDesc = RecordDesc::structure(
    "drm_mode_crtc",
    &[
        Field::u64("set_connectors_ptr"),
        Field::u32("count_connectors"),
        Field::u32("crtc_id"),
        Field::u32("fb_id"),
        Field::u32("x"),
        Field::u32("y"),
        Field::u32("gamma_size"),
        Field::u32("mode_valid"),
        Field::record("mode", &MODEINFO),
    ],
);

static CURSOR: RecordDesc = RecordDesc::structure(
    "drm_mode_cursor",
    &[
        Field::u32("flags"),
        Field::u32("crtc_id"),
        Field::i32("x"),
        Field::i32("y"),
        Field::u32("width"),
        Field::u32("height"),
        Field::u32("handle"),
    ],
);

static CURSOR2: RecordDesc = RecordDesc::structure(
    "drm_mode_cursor2",
    &[
        Field::u32("flags"),
        Field::u32("crtc_id"),
        Field::i32("x"),
        Field::i32("y"),
        Field::u32("width"),
        Field::u32("height"),
        Field::u32("handle"),
        Field::i32("hot_x"),
        Field::i32("hot_y"),
    ],
);

static CRTC_LUT: RecordDesc = RecordDesc::structure(
    "drm_mode_crtc_lut",
    &[
        Field::u32("crtc_id"),
        Field::u32("gamma_size"),
        Field::u64("red"),
        Field::u64("green"),
        Field::u64("blue"),
    ],
);

static GET_ENCODER: RecordDesc = RecordDesc::structure(
    "drm_mode_get_encoder",
    &[
        Field::u32("encoder_id"),
        Field::u32("encoder_type"),
        Field::u32("crtc_id"),
        Field::u32("possible_crtcs"),
        Field::u32("possible_clones"),
    ],
);

static MODE_CMD: RecordDesc = RecordDesc::structure(
    "drm_mode_mode_cmd",
    &[Field::u32("connector_id"), Field::record("mode", &MODEINFO)],
);

static PROPERTY_ENUM: RecordDesc = RecordDesc::structure(
    "drm_mode_property_enum",
    &[Field::u64("value"), Field::bytes("name", 32)],
);

static GET_PROPERTY: RecordDesc = RecordDesc::structure(
    "drm_mode_get_property",
    &[
        Field::u64("values_ptr"),
        Field::u64("enum_blob_ptr"),
        Field::u32("prop_id"),
        Field::u32("flags"),
        Field::bytes("name", 32),
        Field::u32("count_values"),
        Field::u32("count_enum_blobs"),
    ],
);

static SET_PROPERTY: RecordDesc = RecordDesc::structure(
    "drm_mode_connector_set_property",
    &[Field::u64("value"), Field::u32("prop_id"), Field::u32("connector_id")],
);

static GET_BLOB: RecordDesc = RecordDesc::structure(
    "drm_mode_get_blob",
    &[Field::u32("blob_id"), Field::u32("length"), Field::u64("data")],
);

static FB_CMD: RecordDesc = RecordDesc::structure(
    "drm_mode_fb_cmd",
    &[
        Field::u32("fb_id"),
        Field::u32("width"),
        Field::u32("height"),
        Field::u32("pitch"),
        Field::u32("bpp"),
        Field::u32("depth"),
        Field::u32("handle"),
    ],
);

static FB_ID: RecordDesc = RecordDesc::structure("drm_mode_rmfb", &[Field::u32("fb_id")]);

static PAGE_FLIP: RecordDesc = RecordDesc::structure(
    "drm_mode_crtc_page_flip",
    &[
        Field::u32("crtc_id"),
        Field::u32("fb_id"),
        Field::u32("flags"),
        Field::u32("reserved"),
        Field::u64("user_data"),
    ],
);

pub(crate) static CLIP_RECT: RecordDesc = RecordDesc::structure(
    "drm_clip_rect",
    &[Field::u16("x1"), Field::u16("y1"), Field::u16("x2"), Field::u16("y2")],
);

static FB_DIRTY: RecordDesc = RecordDesc::structure(
    "drm_mode_fb_dirty_cmd",
    &[
        Field::u32("fb_id"),
        Field::u32("flags"),
        Field::u32("color"),
        Field::u32("num_clips"),
        Field::u64("clips_ptr"),
    ],
);

static CREATE_DUMB: RecordDesc = RecordDesc::structure(
    "drm_mode_create_dumb",
    &[
        Field::u32("height"),
        Field::u32("width"),
        Field::u32("bpp"),
        Field::u32("flags"),
        Field::u32("handle"),
        Field::u32("pitch"),
        Field::u64("size"),
    ],
);

static MAP_DUMB: RecordDesc = RecordDesc::structure(
    "drm_mode_map_dumb",
    &[Field::u32("handle"), Field::u32("pad"), Field::u64("offset")],
);

static DESTROY_DUMB: RecordDesc =
    RecordDesc::structure("drm_mode_destroy_dumb", &[Field::u32("handle")]);

static GET_PLANE: RecordDesc = RecordDesc::structure(
    "drm_mode_get_plane",
    &[
        Field::u32("plane_id"),
        Field::u32("crtc_id"),
        Field::u32("fb_id"),
        Field::u32("possible_crtcs"),
        Field::u32("gamma_size"),
        Field::u32("count_format_types"),
        Field::u64("format_type_ptr"),
    ],
);

static SET_PLANE: RecordDesc = RecordDesc::structure(
    "drm_mode_set_plane",
    &[
        Field::u32("plane_id"),
        Field::u32("crtc_id"),
        Field::u32("fb_id"),
        Field::u32("flags"),
        Field::i32("crtc_x"),
        Field::i32("crtc_y"),
        Field::u32("crtc_w"),
        Field::u32("crtc_h"),
        Field::u32("src_x"),
        Field::u32("src_y"),
        Field::u32("src_h"),
        Field::u32("src_w"),
    ],
);

static ATOMIC: RecordDesc = RecordDesc::structure(
    "drm_mode_atomic",
    &[
        Field::u32("flags"),
        Field::u32("count_objs"),
        Field::u64("objs_ptr"),
        Field::u64("count_props_ptr"),
        Field::u64("props_ptr"),
        Field::u64("prop_values_ptr"),
        Field::u64("reserved"),
        Field::u64("user_data"),
    ],
);

static CREATE_BLOB: RecordDesc = RecordDesc::structure(
    "drm_mode_create_blob",
    &[Field::u64("data"), Field::u32("length"), Field::u32("blob_id")],
);

static DESTROY_BLOB: RecordDesc =
    RecordDesc::structure("drm_mode_destroy_blob", &[Field::u32("blob_id")]);

static CREATE_LEASE: RecordDesc = RecordDesc::structure(
    "drm_mode_create_lease",
    &[
        Field::u64("object_ids"),
        Field::u32("object_count"),
        Field::u32("flags"),
        Field::u32("lessee_id"),
        Field::u32("fd"),
    ],
);

static LIST_LESSEES: RecordDesc = RecordDesc::structure(
    "drm_mode_list_lessees",
    &[Field::u32("count_lessees"), Field::u32("pad"), Field::u64("lessees_ptr")],
);

static GET_LEASE: RecordDesc = RecordDesc::structure(
    "drm_mode_get_lease",
    &[Field::u32("count_objects"), Field::u32("pad"), Field::u64("objects_ptr")],
);

static REVOKE_LEASE: RecordDesc =
    RecordDesc::structure("drm_mode_revoke_lease", &[Field::u32("lessee_id")]);

/// Fields of a `drm_mode_modeinfo`, without braces.
pub(crate) fn print_modeinfo(out: &mut Render, r: &Record) {
    for field in [
        "clock",
        "hdisplay",
        "hsync_start",
        "hsync_end",
        "htotal",
        "hskew",
        "vdisplay",
        "vsync_start",
        "vsync_end",
        "vtotal",
        "vscan",
        "vrefresh",
    ] {
        out.u(r, field);
    }
    out.flags(r, "flags", &xlat::MODE_FLAGS);
    out.flags(r, "type", &xlat::MODE_TYPE);
    out.cstr(r, "name");
}

pub(crate) fn print_clip_rect(out: &mut Render, r: &Record) {
    out.open();
    out.u(r, "x1");
    out.u(r, "y1");
    out.u(r, "x2");
    out.u(r, "y2");
    out.close();
}

/// 16.16 fixed point as `integer.micro`.
fn fixed16(value: u64) -> String {
    format!("{}.{:06}", value >> 16, ((value & 0xffff) * 15625) >> 10)
}

fn get_resources_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| {
        ctx.out.u(r, "count_fbs");
        ctx.out.u(r, "count_crtcs");
        ctx.out.u(r, "count_connectors");
        ctx.out.u(r, "count_encoders");
    })
}

fn get_resources_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(|ctx, r| {
        ctx.u32_array("fb_id_ptr", r.get("fb_id_ptr"), r.get("count_fbs"));
        ctx.u32_array("crtc_id_ptr", r.get("crtc_id_ptr"), r.get("count_crtcs"));
        ctx.u32_array(
            "connector_id_ptr",
            r.get("connector_id_ptr"),
            r.get("count_connectors"),
        );
        ctx.u32_array("encoder_id_ptr", r.get("encoder_id_ptr"), r.get("count_encoders"));
        for field in [
            "count_fbs",
            "count_crtcs",
            "count_connectors",
            "count_encoders",
            "min_width",
            "max_width",
            "min_height",
            "max_height",
        ] {
            ctx.out.u(r, field);
        }
    })
}

fn print_crtc_tail(ctx: &mut DecodeCtx<'_>, r: &Record) {
    ctx.u32_array(
        "set_connectors_ptr",
        r.get("set_connectors_ptr"),
        r.get("count_connectors"),
    );
    ctx.out.u(r, "count_connectors");
    ctx.out.u(r, "fb_id");
    ctx.out.u(r, "x");
    ctx.out.u(r, "y");
    ctx.out.u(r, "gamma_size");
    ctx.out.u(r, "mode_valid");
    if let Some(mode) = r.sub("mode") {
        ctx.out.open_field("mode");
        print_modeinfo(ctx.out, &mode);
        ctx.out.close();
    }
}

fn get_crtc_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.u(r, "crtc_id"))
}

fn get_crtc_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(print_crtc_tail)
}

fn set_crtc_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.u(r, "crtc_id");
        print_crtc_tail(ctx, r);
    })
}

fn set_crtc_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.out.close();
    Step::Decoded
}

fn print_cursor(out: &mut Render, r: &Record) {
    out.flags(r, "flags", &xlat::CURSOR_FLAGS);
    out.u(r, "crtc_id");
    out.d(r, "x");
    out.d(r, "y");
    out.u(r, "width");
    out.u(r, "height");
    out.u(r, "handle");
}

fn cursor(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| print_cursor(ctx.out, r))
}

fn cursor2(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        print_cursor(ctx.out, r);
        ctx.out.d(r, "hot_x");
        ctx.out.d(r, "hot_y");
    })
}

fn print_gamma_ramps(ctx: &mut DecodeCtx<'_>, r: &Record) {
    let size = r.get("gamma_size");
    ctx.u16_array("red", r.get("red"), size);
    ctx.u16_array("green", r.get("green"), size);
    ctx.u16_array("blue", r.get("blue"), size);
}

fn get_gamma_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.u(r, "crtc_id");
        ctx.out.u(r, "gamma_size");
    })
}

fn get_gamma_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(print_gamma_ramps)
}

fn set_gamma(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "crtc_id");
        ctx.out.u(r, "gamma_size");
        print_gamma_ramps(ctx, r);
    })
}

fn get_encoder_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| ctx.out.u(r, "encoder_id"))
}

fn get_encoder_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(|ctx, r| {
        ctx.out.u(r, "encoder_id");
        ctx.out.xval(r, "encoder_type", &xlat::MODE_ENCODER_TYPE);
        ctx.out.u(r, "crtc_id");
        ctx.out.x(r, "possible_crtcs");
        ctx.out.x(r, "possible_clones");
    })
}

fn get_property_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| {
        ctx.out.u(r, "prop_id");
        ctx.out.u(r, "count_values");
        ctx.out.u(r, "count_enum_blobs");
    })
}

fn get_property_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(|ctx, r| {
        ctx.u64_array("values_ptr", r.get("values_ptr"), r.get("count_values"));
        ctx.record_array(
            "enum_blob_ptr",
            r.get("enum_blob_ptr"),
            r.get("count_enum_blobs"),
            &PROPERTY_ENUM,
            |out, e| {
                out.open();
                out.u(e, "value");
                out.cstr(e, "name");
                out.close();
            },
        );
        ctx.out.flags(r, "flags", &xlat::PROPERTY_FLAGS);
        ctx.out.cstr(r, "name");
        ctx.out.u(r, "count_values");
        ctx.out.u(r, "count_enum_blobs");
    })
}

fn set_property(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "value");
        ctx.out.u(r, "prop_id");
        ctx.out.u(r, "connector_id");
    })
}

fn get_blob_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.u(r, "blob_id"))
}

fn get_blob_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| {
        ctx.out.u(r, "length");
        ctx.out.ptr(r, "data");
    })
}

fn print_fb_geometry(out: &mut Render, r: &Record) {
    for field in ["width", "height", "pitch", "bpp", "depth", "handle"] {
        out.u(r, field);
    }
}

fn get_fb_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.u(r, "fb_id"))
}

fn get_fb_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| print_fb_geometry(ctx.out, r))
}

fn add_fb_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| print_fb_geometry(ctx.out, r))
}

fn fb_id_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.u(r, "fb_id"))
}

fn fb_id(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| ctx.out.u(r, "fb_id"))
}

fn page_flip(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "crtc_id");
        ctx.out.u(r, "fb_id");
        ctx.out.flags(r, "flags", &xlat::PAGE_FLIP_FLAGS);
        ctx.out.nonzero(r, "reserved");
        ctx.out.x(r, "user_data");
    })
}

fn dirty_fb(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        ctx.out.u(r, "fb_id");
        ctx.out.flags(r, "flags", &xlat::DIRTYFB_FLAGS);
        ctx.out.x(r, "color");
        ctx.out.u(r, "num_clips");
        ctx.record_array(
            "clips_ptr",
            r.get("clips_ptr"),
            r.get("num_clips"),
            &CLIP_RECT,
            print_clip_rect,
        );
    })
}

fn create_dumb_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.u(r, "width");
        ctx.out.u(r, "height");
        ctx.out.u(r, "bpp");
        ctx.out.x(r, "flags");
    })
}

fn create_dumb_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| {
        ctx.out.u(r, "handle");
        ctx.out.u(r, "pitch");
        ctx.out.u(r, "size");
    })
}

fn map_dumb_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| ctx.out.u(r, "handle"))
}

fn map_dumb_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.x(r, "offset"))
}

fn dumb_handle(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| ctx.out.u(r, "handle"))
}

fn get_plane_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| {
        ctx.out.u(r, "plane_id");
        ctx.out.u(r, "count_format_types");
    })
}

fn get_plane_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(|ctx, r| {
        for field in ["plane_id", "crtc_id", "fb_id"] {
            ctx.out.u(r, field);
        }
        ctx.out.x(r, "possible_crtcs");
        ctx.out.u(r, "gamma_size");
        ctx.out.u(r, "count_format_types");
        ctx.array(
            "format_type_ptr",
            r.get("format_type_ptr"),
            r.get("count_format_types"),
            4,
            crate::array::elem::u32_hex,
        );
    })
}

fn set_plane(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        for field in ["plane_id", "crtc_id", "fb_id"] {
            ctx.out.u(r, field);
        }
        ctx.out.x(r, "flags");
        ctx.out.d(r, "crtc_x");
        ctx.out.d(r, "crtc_y");
        ctx.out.u(r, "crtc_w");
        ctx.out.u(r, "crtc_h");
        for field in ["src_x", "src_y", "src_h", "src_w"] {
            ctx.out.u(r, field);
            ctx.out.comment(fixed16(r.get(field)));
        }
    })
}

fn atomic(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| {
        let count = r.get("count_objs");
        ctx.out.flags(r, "flags", &xlat::ATOMIC_FLAGS);
        ctx.out.u(r, "count_objs");
        ctx.u32_array("objs_ptr", r.get("objs_ptr"), count);
        ctx.u32_array("count_props_ptr", r.get("count_props_ptr"), count);
        ctx.u32_array("props_ptr", r.get("props_ptr"), count);
        ctx.u64_array("prop_values_ptr", r.get("prop_values_ptr"), count);
        ctx.out.nonzero(r, "reserved");
        ctx.out.x(r, "user_data");
    })
}

fn create_blob_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.out.ptr(r, "data");
        ctx.out.u(r, "length");
    })
}

fn create_blob_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| ctx.out.u(r, "blob_id"))
}

fn destroy_blob(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| ctx.out.u(r, "blob_id"))
}

fn create_lease_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.begin(|ctx, r| {
        ctx.u32_array("object_ids", r.get("object_ids"), r.get("object_count"));
        ctx.out.u(r, "object_count");
        ctx.out.flags(r, "flags", &xlat::LEASE_FLAGS);
    })
}

fn create_lease_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.finish(|ctx, r| {
        ctx.out.u(r, "lessee_id");
        ctx.out.d(r, "fd");
    })
}

fn list_lessees_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| {
        ctx.out.u(r, "count_lessees");
        ctx.out.nonzero(r, "pad");
    })
}

fn list_lessees_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(|ctx, r| {
        ctx.out.u(r, "count_lessees");
        ctx.u32_array("lessees_ptr", r.get("lessees_ptr"), r.get("count_lessees"));
    })
}

fn get_lease_enter(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.entry(|ctx, r| {
        ctx.out.u(r, "count_objects");
        ctx.out.nonzero(r, "pad");
    })
}

fn get_lease_exit(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.update(|ctx, r| {
        ctx.out.u(r, "count_objects");
        ctx.u32_array("objects_ptr", r.get("objects_ptr"), r.get("count_objects"));
    })
}

fn revoke_lease(ctx: &mut DecodeCtx<'_>) -> Step {
    ctx.whole(|ctx, r| ctx.out.u(r, "lessee_id"))
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec::iowr("DRM_IOCTL_MODE_GETRESOURCES", 0xa0, &CARD_RES)
        .enter(get_resources_enter)
        .exit(get_resources_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_GETCRTC", 0xa1, &CRTC)
        .enter(get_crtc_enter)
        .exit(get_crtc_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_SETCRTC", 0xa2, &CRTC)
        .enter(set_crtc_enter)
        .exit(set_crtc_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_CURSOR", 0xa3, &CURSOR).enter(cursor),
    CommandSpec::iowr("DRM_IOCTL_MODE_GETGAMMA", 0xa4, &CRTC_LUT)
        .enter(get_gamma_enter)
        .exit(get_gamma_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_SETGAMMA", 0xa5, &CRTC_LUT).enter(set_gamma),
    CommandSpec::iowr("DRM_IOCTL_MODE_GETENCODER", 0xa6, &GET_ENCODER)
        .enter(get_encoder_enter)
        .exit(get_encoder_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_ATTACHMODE", 0xa8, &MODE_CMD),
    CommandSpec::iowr("DRM_IOCTL_MODE_DETACHMODE", 0xa9, &MODE_CMD),
    CommandSpec::iowr("DRM_IOCTL_MODE_GETPROPERTY", 0xaa, &GET_PROPERTY)
        .enter(get_property_enter)
        .exit(get_property_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_SETPROPERTY", 0xab, &SET_PROPERTY).enter(set_property),
    CommandSpec::iowr("DRM_IOCTL_MODE_GETPROPBLOB", 0xac, &GET_BLOB)
        .enter(get_blob_enter)
        .exit(get_blob_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_GETFB", 0xad, &FB_CMD)
        .enter(get_fb_enter)
        .exit(get_fb_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_ADDFB", 0xae, &FB_CMD)
        .enter(add_fb_enter)
        .exit(fb_id_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_RMFB", 0xaf, &FB_ID).enter(fb_id),
    CommandSpec::iowr("DRM_IOCTL_MODE_PAGE_FLIP", 0xb0, &PAGE_FLIP).enter(page_flip),
    CommandSpec::iowr("DRM_IOCTL_MODE_DIRTYFB", 0xb1, &FB_DIRTY).enter(dirty_fb),
    CommandSpec::iowr("DRM_IOCTL_MODE_CREATE_DUMB", 0xb2, &CREATE_DUMB)
        .enter(create_dumb_enter)
        .exit(create_dumb_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_MAP_DUMB", 0xb3, &MAP_DUMB)
        .enter(map_dumb_enter)
        .exit(map_dumb_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_DESTROY_DUMB", 0xb4, &DESTROY_DUMB).enter(dumb_handle),
    CommandSpec::iowr("DRM_IOCTL_MODE_GETPLANE", 0xb6, &GET_PLANE)
        .enter(get_plane_enter)
        .exit(get_plane_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_SETPLANE", 0xb7, &SET_PLANE).enter(set_plane),
    CommandSpec::iowr("DRM_IOCTL_MODE_CURSOR2", 0xbb, &CURSOR2).enter(cursor2),
    CommandSpec::iowr("DRM_IOCTL_MODE_ATOMIC", 0xbc, &ATOMIC).enter(atomic),
    CommandSpec::iowr("DRM_IOCTL_MODE_CREATEPROPBLOB", 0xbd, &CREATE_BLOB)
        .enter(create_blob_enter)
        .exit(create_blob_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_DESTROYPROPBLOB", 0xbe, &DESTROY_BLOB).enter(destroy_blob),
    CommandSpec::iowr("DRM_IOCTL_MODE_CREATE_LEASE", 0xc6, &CREATE_LEASE)
        .enter(create_lease_enter)
        .exit(create_lease_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_LIST_LESSEES", 0xc7, &LIST_LESSEES)
        .enter(list_lessees_enter)
        .exit(list_lessees_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_GET_LEASE", 0xc8, &GET_LEASE)
        .enter(get_lease_enter)
        .exit(get_lease_exit),
    CommandSpec::iowr("DRM_IOCTL_MODE_REVOKE_LEASE", 0xc9, &REVOKE_LEASE).enter(revoke_lease),
];

#[cfg(test)]
mod tests {
    use super::super::testing::{decode, iowr, Bytes};
    use super::*;
    use crate::memory::MemoryImage;
    use crate::session::Outcome;

    const OK: Outcome = Outcome::Success(0);

    #[test]
    fn test_fixed16() {
        assert_eq!(fixed16(0x0001_8000), "1.500000");
        assert_eq!(fixed16(1920 << 16), "1920.000000");
        assert_eq!(fixed16(0x0000_0001), "0.000015");
    }

    #[test]
    fn test_get_resources_arrays_after_exit() {
        let mut mem = MemoryImage::new();
        let res = Bytes::default()
            .u64(0x2000)
            .u64(0x2100)
            .u64(0)
            .u64(0x2300)
            .u32(2)
            .u32(1)
            .u32(0)
            .u32(1)
            .u32(0)
            .u32(8192)
            .u32(0)
            .u32(8192);
        mem.map(0x1000, res.0);
        mem.map(0x2000, Bytes::default().u32(71).u32(72).0);
        mem.map(0x2100, Bytes::default().u32(41).0);
        mem.map(0x2300, Bytes::default().u32(43).0);

        assert_eq!(
            decode(&mem, iowr(0xa0, 64), 0x1000, OK),
            "{count_fbs=2, count_crtcs=1, count_connectors=0, count_encoders=1} => \
             {fb_id_ptr=[71, 72], crtc_id_ptr=[41], connector_id_ptr=[], encoder_id_ptr=[43], \
             count_fbs=2, count_crtcs=1, count_connectors=0, count_encoders=1, \
             min_width=0, max_width=8192, min_height=0, max_height=8192}"
        );
        assert_eq!(
            decode(&mem, iowr(0xa0, 64), 0x1000, Outcome::Failure(libc::EINVAL)),
            "{count_fbs=2, count_crtcs=1, count_connectors=0, count_encoders=1}"
        );
    }

    fn modeinfo(name: &str) -> Bytes {
        Bytes::default()
            .u32(148_500)
            .u16(1920)
            .u16(2008)
            .u16(2052)
            .u16(2200)
            .u16(0)
            .u16(1080)
            .u16(1084)
            .u16(1089)
            .u16(1125)
            .u16(0)
            .u32(60)
            .u32(0x5)
            .u32(0x48)
            .text(name, 32)
    }

    #[test]
    fn test_get_crtc_nested_mode() {
        let mut mem = MemoryImage::new();
        let crtc = Bytes::default()
            .u64(0)
            .u32(0)
            .u32(41)
            .u32(90)
            .u32(0)
            .u32(0)
            .u32(256)
            .u32(1)
            .extend(modeinfo("1920x1080"));
        mem.map(0x1000, crtc.0);
        assert_eq!(
            decode(&mem, iowr(0xa1, 104), 0x1000, OK),
            "{crtc_id=41, set_connectors_ptr=[], count_connectors=0, fb_id=90, x=0, y=0, \
             gamma_size=256, mode_valid=1, mode={clock=148500, hdisplay=1920, hsync_start=2008, \
             hsync_end=2052, htotal=2200, hskew=0, vdisplay=1080, vsync_start=1084, \
             vsync_end=1089, vtotal=1125, vscan=0, vrefresh=60, \
             flags=MODE_FLAG_PHSYNC|MODE_FLAG_PVSYNC, \
             type=MODE_TYPE_PREFERRED|MODE_TYPE_DRIVER, name=\"1920x1080\"}}"
        );
    }

    #[test]
    fn test_set_crtc_decoded_on_entry() {
        let mut mem = MemoryImage::new();
        let crtc = Bytes::default()
            .u64(0x3000)
            .u32(1)
            .u32(41)
            .u32(90)
            .u32(0)
            .u32(0)
            .u32(0)
            .u32(0)
            .extend(modeinfo(""));
        mem.map(0x1000, crtc.0);
        mem.map(0x3000, Bytes::default().u32(77).0);
        let text = decode(&mem, iowr(0xa2, 104), 0x1000, Outcome::Failure(libc::EINVAL));
        assert!(text.starts_with("{crtc_id=41, set_connectors_ptr=[77], count_connectors=1"));
        assert!(text.ends_with("name=\"\"}}"));
    }

    #[test]
    fn test_set_gamma_ramps() {
        let mut mem = MemoryImage::new();
        mem.map(
            0x1000,
            Bytes::default().u32(41).u32(2).u64(0x2000).u64(0x2004).u64(0).0,
        );
        mem.map(0x2000, Bytes::default().u16(0).u16(0xffff).u16(1).u16(2).0);
        assert_eq!(
            decode(&mem, iowr(0xa5, 32), 0x1000, OK),
            "{crtc_id=41, gamma_size=2, red=[0, 65535], green=[1, 2], blue=NULL}"
        );
    }

    #[test]
    fn test_get_encoder() {
        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().u32(43).u32(2).u32(41).u32(1).u32(0).0);
        assert_eq!(
            decode(&mem, iowr(0xa6, 20), 0x1000, OK),
            "{encoder_id=43} => {encoder_id=43, encoder_type=MODE_ENCODER_TMDS, crtc_id=41, \
             possible_crtcs=0x1, possible_clones=0}"
        );
    }

    #[test]
    fn test_get_property_enum_blobs() {
        let mut mem = MemoryImage::new();
        let prop = Bytes::default()
            .u64(0x2000)
            .u64(0x3000)
            .u32(5)
            .u32(0x8)
            .text("DPMS", 32)
            .u32(1)
            .u32(2);
        mem.map(0x1000, prop.0);
        mem.map(0x2000, Bytes::default().u64(3).0);
        mem.map(
            0x3000,
            Bytes::default().u64(0).text("On", 32).u64(3).text("Off", 32).0,
        );
        assert_eq!(
            decode(&mem, iowr(0xaa, 64), 0x1000, OK),
            "{prop_id=5, count_values=1, count_enum_blobs=2} => {values_ptr=[3], \
             enum_blob_ptr=[{value=0, name=\"On\"}, {value=3, name=\"Off\"}], \
             flags=MODE_PROP_ENUM, name=\"DPMS\", count_values=1, count_enum_blobs=2}"
        );
    }

    #[test]
    fn test_dirty_fb_clip_rects() {
        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().u32(90).u32(0).u32(0).u32(1).u64(0x2000).0);
        mem.map(0x2000, Bytes::default().u16(0).u16(0).u16(64).u16(32).0);
        assert_eq!(
            decode(&mem, iowr(0xb1, 24), 0x1000, OK),
            "{fb_id=90, flags=0, color=0, num_clips=1, clips_ptr=[{x1=0, y1=0, x2=64, y2=32}]}"
        );
    }

    #[test]
    fn test_create_dumb() {
        let mut mem = MemoryImage::new();
        let dumb = Bytes::default().u32(480).u32(640).u32(32).u32(0).u32(4).u32(2560).u64(1_228_800);
        mem.map(0x1000, dumb.0);
        assert_eq!(
            decode(&mem, iowr(0xb2, 32), 0x1000, OK),
            "{width=640, height=480, bpp=32, flags=0, handle=4, pitch=2560, size=1228800}"
        );
        assert_eq!(
            decode(&mem, iowr(0xb2, 32), 0x1000, Outcome::Failure(libc::ENOMEM)),
            "{width=640, height=480, bpp=32, flags=0}"
        );
    }

    #[test]
    fn test_set_plane_fixed_point() {
        let mut mem = MemoryImage::new();
        let plane = Bytes::default()
            .u32(31)
            .u32(41)
            .u32(90)
            .u32(0)
            .i32(-8)
            .i32(0)
            .u32(64)
            .u32(64)
            .u32(0)
            .u32(0x0001_8000)
            .u32(64 << 16)
            .u32(64 << 16);
        mem.map(0x1000, plane.0);
        assert_eq!(
            decode(&mem, iowr(0xb7, 48), 0x1000, OK),
            "{plane_id=31, crtc_id=41, fb_id=90, flags=0, crtc_x=-8, crtc_y=0, crtc_w=64, \
             crtc_h=64, src_x=0 /* 0.000000 */, src_y=98304 /* 1.500000 */, \
             src_h=4194304 /* 64.000000 */, src_w=4194304 /* 64.000000 */}"
        );
    }

    #[test]
    fn test_atomic_arrays() {
        let mut mem = MemoryImage::new();
        let commit = Bytes::default()
            .u32(0x0400)
            .u32(1)
            .u64(0x2000)
            .u64(0x2010)
            .u64(0x2020)
            .u64(0x2030)
            .u64(0)
            .u64(0);
        mem.map(0x1000, commit.0);
        mem.map(0x2000, Bytes::default().u32(41).0);
        mem.map(0x2010, Bytes::default().u32(1).0);
        mem.map(0x2020, Bytes::default().u32(20).0);
        mem.map(0x2030, Bytes::default().u64(90).0);
        assert_eq!(
            decode(&mem, iowr(0xbc, 56), 0x1000, OK),
            "{flags=MODE_ATOMIC_ALLOW_MODESET, count_objs=1, objs_ptr=[41], count_props_ptr=[1], \
             props_ptr=[20], prop_values_ptr=[90], user_data=0}"
        );
    }

    #[test]
    fn test_list_lessees() {
        let mut mem = MemoryImage::new();
        mem.map(0x1000, Bytes::default().u32(2).u32(0).u64(0x2000).0);
        mem.map(0x2000, Bytes::default().u32(1).u32(2).0);
        assert_eq!(
            decode(&mem, iowr(0xc7, 16), 0x1000, OK),
            "{count_lessees=2} => {count_lessees=2, lessees_ptr=[1, 2]}"
        );
    }
}
