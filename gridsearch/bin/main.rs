use gridsearch::{util::parse_img, Algorithm, BreadthFirst, DepthFirst, GridMap, Point};
use rand::{rngs::StdRng, SeedableRng};

/// Runs both searches corner to corner, on the image given as first argument or on a seeded
/// random world, and dumps the visit depths of each.
fn main() -> Result<(), anyhow::Error> {
    let map = match std::env::args().nth(1) {
        Some(path) => parse_img(&image::open(path)?)?,
        None => GridMap::random(10, 20, &mut StdRng::seed_from_u64(0)),
    };
    println!("{}", map);

    let start = Point { row: 0, col: 0 };
    let goal = Point {
        row: map.rows.saturating_sub(1),
        col: map.columns.saturating_sub(1),
    };

    for algorithm in Algorithm::ALL {
        let (res, visited) = match algorithm {
            Algorithm::Dfs => DepthFirst::new(&map, start, goal).finish(&map),
            Algorithm::Bfs => BreadthFirst::new(&map, start, goal).finish(&map),
        };

        println!("{}: {:?}", algorithm, res);
        println!("{}", visited);
    }

    Ok(())
}
