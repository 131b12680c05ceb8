/// WGSL Blinn-Phong shader for composite mesh parts.
///
/// Vertex buffer 0 carries the tessellated part, buffer 1 one instance with
/// the part's world matrix and material.
pub const PHONG_SHADER: &str = r#"
const MAX_LIGHTS: u32 = 4u;

struct Globals {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    ambient: vec4<f32>,
    light_counts: vec4<u32>,
    directional_dir: array<vec4<f32>, 4>,
    directional_color: array<vec4<f32>, 4>,
    point_position: array<vec4<f32>, 4>,
    point_color: array<vec4<f32>, 4>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) normal_0: vec4<f32>,
    @location(7) normal_1: vec4<f32>,
    @location(8) normal_2: vec4<f32>,
    @location(9) color: vec4<f32>,
    @location(10) emissive: vec4<f32>,
    @location(11) specular: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) emissive: vec3<f32>,
    @location(4) specular: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let normal_matrix = mat3x3<f32>(
        instance.normal_0.xyz,
        instance.normal_1.xyz,
        instance.normal_2.xyz,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = globals.view_proj * world_pos;
    out.world_position = world_pos.xyz;
    out.world_normal = normal_matrix * vertex.normal;
    out.color = instance.color;
    out.emissive = instance.emissive.rgb;
    out.specular = instance.specular;
    return out;
}

fn blinn(n: vec3<f32>, l: vec3<f32>, v: vec3<f32>, shininess: f32) -> f32 {
    let h = normalize(l + v);
    return pow(max(dot(n, h), 0.0), shininess);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    let v = normalize(globals.camera_position.xyz - in.world_position);
    let shininess = max(in.specular.a, 1.0);

    var diffuse = globals.ambient.rgb;
    var specular = vec3<f32>(0.0);

    let directional = min(globals.light_counts.x, MAX_LIGHTS);
    for (var i = 0u; i < directional; i++) {
        let l = globals.directional_dir[i].xyz;
        let ndl = max(dot(n, l), 0.0);
        let c = globals.directional_color[i].rgb;
        diffuse += c * ndl;
        if (ndl > 0.0) {
            specular += c * blinn(n, l, v, shininess);
        }
    }

    let points = min(globals.light_counts.y, MAX_LIGHTS);
    for (var i = 0u; i < points; i++) {
        let to_light = globals.point_position[i].xyz - in.world_position;
        let d = length(to_light);
        let l = to_light / max(d, 1e-5);
        let cutoff = globals.point_position[i].w;
        let falloff = select(1.0, clamp(1.0 - d / cutoff, 0.0, 1.0), cutoff > 0.0);
        let ndl = max(dot(n, l), 0.0);
        let c = globals.point_color[i].rgb * falloff;
        diffuse += c * ndl;
        if (ndl > 0.0) {
            specular += c * blinn(n, l, v, shininess);
        }
    }

    let rgb = in.color.rgb * diffuse + in.specular.rgb * specular + in.emissive;
    return vec4<f32>(rgb, in.color.a);
}
"#;
