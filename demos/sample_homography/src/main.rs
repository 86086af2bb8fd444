use argh::FromArgs;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::path::PathBuf;

use superpoint_geometry::{
    invert_homography, FlatHomography, HomographySampler, ImageShape, Quad, SamplerConfig,
};

#[derive(FromArgs)]
/// Sample random homographies for an image size and print them as JSON lines
struct Args {
    /// height of the image in pixels
    #[argh(option)]
    height: usize,

    /// width of the image in pixels
    #[argh(option)]
    width: usize,

    /// number of homographies to sample
    #[argh(option, short = 'n', default = "1")]
    num: usize,

    /// seed of the random generator, drawn from the OS when omitted
    #[argh(option, short = 's')]
    seed: Option<u64>,

    /// path to a JSON sampler configuration
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct Record {
    homography: FlatHomography,
    inverse: FlatHomography,
    patch: Quad,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let config: SamplerConfig = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => SamplerConfig::default(),
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let shape = ImageShape::new(args.height, args.width);
    let sampler = HomographySampler::new(config);
    sampler.config().validate()?;
    log::info!("sampler config: {:?}", sampler.config());

    for _ in 0..args.num {
        let sample = sampler.sample_with_patch(shape, &mut rng)?;
        let record = Record {
            homography: sample.homography,
            inverse: invert_homography(&sample.homography)?,
            patch: sample.patch,
        };
        println!("{}", serde_json::to_string(&record)?);
    }

    Ok(())
}
