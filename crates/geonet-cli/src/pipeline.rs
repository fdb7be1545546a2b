//! Geometry planning and hemisphere rendering.

use std::time::Duration;

use geonet_config::{Config, GeoRef, TransformConfig};
use geonet_coords::LatLon;
use geonet_icosa::{
    FaceGraph, FaceId, ForbiddenEdges, HemisphereSplitter, Icosahedron, Pin, Region, RepairBound, SeamSpec,
    apply_overrides,
};
use geonet_raster::{ElevationRange, OutputPaths, Rasterizer, write_outputs};
use geonet_tiles::{HttpFetcher, RetryPolicy, TerrariumSource, TileCache, TileStore, WorldCoverSource};
use geonet_unfold::{Net, NetUnfolder, PlanarTransform};
use tracing::info;

use crate::error::PipelineError;

/// One unfolded hemisphere, ready to rasterise.
#[derive(Debug)]
pub struct Hemisphere {
    /// `"west"` or `"east"`.
    pub name: &'static str,
    /// Output file prefix.
    pub prefix: String,
    /// Faces in this hemisphere.
    pub faces: Region,
    /// Face the unfolding started from.
    pub root: FaceId,
    /// Seam edges the unfolding did not cross.
    pub forbidden: ForbiddenEdges,
    /// Normalised planar net.
    pub net: Net,
}

/// Everything derived from the configuration before any tile is fetched.
#[derive(Debug)]
pub struct Plan {
    /// The (pinned) solid both nets were unfolded from.
    pub ico: Icosahedron,
    /// West hemisphere and its net.
    pub west: Hemisphere,
    /// East hemisphere and its net.
    pub east: Hemisphere,
}

fn latlon(r: GeoRef) -> LatLon {
    LatLon::new(r.lat, r.lon)
}

fn planar(t: TransformConfig) -> PlanarTransform {
    PlanarTransform {
        mirror_x: t.mirror_x,
        mirror_y: t.mirror_y,
        rot90_left: t.rot90_left,
    }
}

/// Pole-oriented icosahedron, pinned when the config asks for it.
pub fn build_icosahedron(config: &Config) -> Result<Icosahedron, PipelineError> {
    let ico = if config.pin.enabled {
        Icosahedron::pinned(&Pin {
            vertex_id: config.pin.vertex_id,
            target: LatLon::new(config.pin.lat, config.pin.lon),
            twist_deg: config.pin.twist_deg,
        })?
    } else {
        Icosahedron::pole_oriented()?
    };
    info!(
        "Icosahedron: {} vertices, {} faces",
        ico.vertices().len(),
        ico.faces().len()
    );
    Ok(ico)
}

/// Split, unfold and normalise both hemispheres.
pub fn plan(config: &Config) -> Result<Plan, PipelineError> {
    let ico = build_icosahedron(config)?;
    let graph = FaceGraph::new(ico.faces());

    let split = HemisphereSplitter::new(&ico, &graph)
        .with_repair_bound(RepairBound {
            max_rounds: config.split.repair_rounds,
            candidates_per_side: config.split.repair_candidates,
        })
        .split(latlon(config.split.east_ref), latlon(config.split.west_ref))?;
    let split = apply_overrides(&graph, split, &config.split.force_east, &config.split.force_west)?;
    info!("West faces: {:?}", split.west);
    info!("East faces: {:?}", split.east);

    // The seam starts at the pinned vertex, so the east net grows from there.
    let east_anchor = if config.pin.enabled {
        LatLon::new(config.pin.lat, config.pin.lon)
    } else {
        latlon(config.split.east_ref)
    };
    let east_root = ico
        .nearest_face(split.east.iter().copied(), east_anchor.to_unit())
        .ok_or(PipelineError::EmptyHemisphere("east"))?;
    let west_root = *split.west.first().ok_or(PipelineError::EmptyHemisphere("west"))?;
    info!("Roots: west={west_root} east={east_root}");

    let east_forbidden = if config.seam.enabled {
        SeamSpec {
            lon: config.seam.lon,
            start_lat: config.seam.start_lat,
            tolerance_deg: config.seam.tolerance_deg,
        }
        .forbidden_edges(&ico, &graph, &split.east)
    } else {
        ForbiddenEdges::new()
    };
    info!("Seam forbids {} east edges", east_forbidden.len());

    let unfolder = NetUnfolder::new(&ico, &graph, config.net.edge_px);
    let unfold = |name: &'static str, root, faces: &Region, forbidden: &ForbiddenEdges| {
        unfolder
            .unfold(root, faces, forbidden)
            .map_err(|source| PipelineError::Unfold { hemisphere: name, source })
    };
    let west_net = unfold("west", west_root, &split.west, &ForbiddenEdges::new())?;
    let east_net = unfold("east", east_root, &split.east, &east_forbidden)?;
    let west_net = planar(config.west_transform).normalize(&west_net);
    let east_net = planar(config.east_transform).normalize(&east_net);

    let west = Hemisphere {
        name: "west",
        prefix: config.output.west_prefix.clone(),
        faces: split.west,
        root: west_root,
        forbidden: ForbiddenEdges::new(),
        net: west_net,
    };
    let east = Hemisphere {
        name: "east",
        prefix: config.output.east_prefix.clone(),
        faces: split.east,
        root: east_root,
        forbidden: east_forbidden,
        net: east_net,
    };
    Ok(Plan { ico, west, east })
}

/// Log the placed triangles of a hemisphere.
pub fn log_net(hemisphere: &Hemisphere) {
    if let Some(bounds) = hemisphere.net.bounds() {
        let size = bounds.size();
        info!(
            "{} net ({}): faces {:?}, root {}, {} seam edges, {:.0}x{:.0} units",
            hemisphere.name,
            hemisphere.prefix,
            hemisphere.faces,
            hemisphere.root,
            hemisphere.forbidden.len(),
            size.x,
            size.y
        );
    }
    for (face, placement) in hemisphere.net.iter() {
        let [a, b, c] = placement.points;
        info!(
            "  face {face:02} {:?}: ({:.1}, {:.1}) ({:.1}, {:.1}) ({:.1}, {:.1})",
            placement.order, a.x, a.y, b.x, b.y, c.x, c.y
        );
    }
}

/// Retry policy from the `fetch` section.
#[must_use]
pub fn retry_policy(config: &Config) -> RetryPolicy {
    RetryPolicy {
        attempts: config.fetch.attempts,
        backoff_base: config.fetch.backoff_base,
        backoff_unit: Duration::from_secs(1),
        timeout: Duration::from_secs(config.fetch.timeout_secs),
    }
}

/// Rasteriser workers per hemisphere.
fn worker_threads(config: &Config) -> usize {
    match config.render.threads {
        0 if config.render.parallel_hemispheres => (num_cpus::get() / 2).max(1),
        0 => num_cpus::get(),
        n => n,
    }
}

/// Fetch tiles, rasterise both hemispheres and write their images.
pub fn render(config: &Config, plan: &Plan) -> Result<Vec<OutputPaths>, PipelineError> {
    let policy = retry_policy(config);
    let elevation = TileCache::new(
        TerrariumSource::new(
            HttpFetcher::new(policy),
            config.elevation.url_template.clone(),
            config.elevation.zoom,
            config.elevation.tile_size,
        ),
        TileStore::new(&config.elevation.cache_dir),
        config.elevation.max_mem_tiles,
    );
    let land = TileCache::new(
        WorldCoverSource::new(
            HttpFetcher::new(policy),
            config.land_cover.url_template.clone(),
            config.land_cover.tile_res,
        ),
        TileStore::new(&config.land_cover.cache_dir),
        config.land_cover.max_mem_tiles,
    );

    let range = ElevationRange {
        lo: config.output.elevation_lo_m,
        hi: config.output.elevation_hi_m,
        sea_black: config.output.sea_level_black,
    };
    let rasterizer = Rasterizer::new(&plan.ico, config.net.margin_px).with_threads(worker_threads(config));

    let render_one = |h: &Hemisphere| -> Result<OutputPaths, PipelineError> {
        let canvas = rasterizer.render(&h.net, &elevation, &land)?;
        info!(
            "{} canvas {}x{}, {} px covered",
            h.name,
            canvas.width(),
            canvas.height(),
            canvas.covered()
        );
        let paths = write_outputs(&canvas, &config.output.dir, &h.prefix, range)?;
        info!(
            "Wrote {}, {}, {}",
            paths.elevation.display(),
            paths.land_cover.display(),
            paths.mask.display()
        );
        Ok(paths)
    };

    let outputs = if config.render.parallel_hemispheres {
        std::thread::scope(|s| {
            let west = s.spawn(|| render_one(&plan.west));
            let east = render_one(&plan.east);
            let west = west
                .join()
                .map_err(|_| PipelineError::RenderPanicked(plan.west.name))?;
            Ok::<_, PipelineError>(vec![west?, east?])
        })?
    } else {
        vec![render_one(&plan.west)?, render_one(&plan.east)?]
    };

    info!("Elevation cache: {}", elevation.stats());
    info!("Land-cover cache: {}", land.stats());
    Ok(outputs)
}
