// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate failure;
extern crate image;
#[macro_use]
extern crate log;
extern crate mandelbrot;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use failure::{err_msg, Error};
use image::ColorType;
use mandelbrot::{Canvas, Domain, Palette, RenderConfig, Resolution};
use num::Complex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

// "800x600" or "-2.0,1.2": two values around a separator.
fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    let index = s.find(separator)?;
    let left = T::from_str(&s[..index]).ok()?;
    let right = T::from_str(&s[index + 1..]).ok()?;
    Some((left, right))
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    parse_pair(s, ',').map(|(re, im)| Complex { re, im })
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    parse_pair::<T>(s, separator)
        .map(|_| ())
        .ok_or_else(|| err.to_string())
}

// Inclusive bounds; the messages become clap's error text.
fn validate_range<T: FromStr + Ord>(
    s: &str,
    range: (T, T),
    not_a_number: &str,
    out_of_range: &str,
) -> Result<(), String> {
    let value = T::from_str(s).map_err(|_| not_a_number.to_string())?;
    if value >= range.0 && value <= range.1 {
        Ok(())
    } else {
        Err(out_of_range.to_string())
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const THREADS: &str = "threads";
const ITERATIONS: &str = "iterations";
const COLORMAP: &str = "colormap";
const NO_EARLY_EXIT: &str = "no-early-exit";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("mandel")
        .version("0.1.0")
        .about("Escape-time Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value("output/mandelbrot.png")
                .help("Output PNG file"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1200x800")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image, WIDTHxHEIGHT"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2.0,-1.2")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the complex plane, RE,IM"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("1.0,1.2")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the complex plane, RE,IM"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        (1, max_threads),
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in solver"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("50")
                .validator(move |s| {
                    validate_range(
                        &s,
                        (2, 200_000),
                        "Could not parse iteration count",
                        "Iteration count must be between 2 and 200000",
                    )
                })
                .help("Iterations before a point is declared bounded"),
        )
        .arg(
            Arg::with_name(COLORMAP)
                .long(COLORMAP)
                .short("c")
                .takes_value(true)
                .default_value("inferno")
                .possible_values(Palette::NAMES)
                .help("Colormap used to paint escape speed"),
        )
        .arg(
            Arg::with_name(NO_EARLY_EXIT)
                .long(NO_EARLY_EXIT)
                .help("Run the full iteration budget even after every point escaped"),
        )
        .get_matches()
}

fn value<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, Error> {
    matches
        .value_of(name)
        .ok_or_else(|| err_msg(format!("Missing value for --{}", name)))
}

fn config_from(matches: &ArgMatches) -> Result<RenderConfig, Error> {
    let size: (usize, usize) =
        parse_pair(value(matches, SIZE)?, 'x').ok_or_else(|| err_msg("Error parsing image dimensions"))?;
    let leftlower = parse_complex(value(matches, LEFTLOWER)?)
        .ok_or_else(|| err_msg("Error parsing left lower point"))?;
    let rightupper = parse_complex(value(matches, RIGHTUPPER)?)
        .ok_or_else(|| err_msg("Error parsing right upper point"))?;

    Ok(RenderConfig {
        resolution: Resolution(size.0, size.1),
        domain: Domain::from_corners(leftlower, rightupper)?,
        max_iter: usize::from_str(value(matches, ITERATIONS)?)?,
        threads: usize::from_str(value(matches, THREADS)?)?,
        early_exit: !matches.is_present(NO_EARLY_EXIT),
    })
}

// Row 0 of the canvas is the bottom of the plane, so rows are written
// last to first to keep the imaginary axis pointing up.
fn pixelate(canvas: &Canvas) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(canvas.width() * canvas.height() * 4);
    for row in canvas.rows().rev() {
        for colour in row {
            pixels.extend_from_slice(&colour.to_rgba8());
        }
    }
    pixels
}

fn write_image(outfile: &str, canvas: &Canvas) -> Result<(), Error> {
    let path = Path::new(outfile);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    image::save_buffer(
        &path,
        &pixelate(canvas),
        canvas.width() as u32,
        canvas.height() as u32,
        ColorType::RGBA(8),
    )?;
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let config = config_from(matches)?;
    let palette = Palette::from_str(value(matches, COLORMAP)?)?;
    info!("rendering {:?} with {}", config, palette);

    let canvas = mandelbrot::render(&config, &palette.gradient())?;
    let outfile = value(matches, OUTPUT)?;
    write_image(outfile, &canvas)?;
    println!("Image saved to: {}", outfile);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
