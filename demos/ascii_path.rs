use glam::Vec2;
use skirmish_grid::*;

const MAP: &str = "
    ....................
    ....................
    ..######............
    .......#.....~~~~...
    .......#.....~~~~...
    .......#............
    .......#######......
    ....................
    ...............#....
    ...............#....
";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let terrain = GridTerrain::from_ascii(MAP, 1.0);
    let (w, h) = (terrain.width() as i32, terrain.height() as i32);
    let cfg = PathfinderConfig { cell_size: 1.0, default_unit_radius: 0.0, ..Default::default() };
    let mut pf = Pathfinder::new(cfg).with_terrain(terrain.clone());

    let start = Vec2::new(0.5, 9.5);
    let goal = Vec2::new(18.5, 0.5);
    let path = pf.find_path(&(), start, goal, None);
    println!(
        "found={} cost={:.2} explored={} waypoints={} length={:.2}",
        path.found,
        path.cost,
        path.nodes_explored,
        path.points.len(),
        path.length()
    );

    let field = pf.generate_flow_field(&(), goal, GridBounds::new(GridCoord::new(0, 0), GridCoord::new(w - 1, h - 1)));
    for y in 0..h {
        let row: String = (0..w)
            .map(|x| {
                let c = GridCoord::new(x, y);
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if path.points.contains(&center) {
                    return '*';
                }
                if !terrain.is_walkable(center) {
                    return '#';
                }
                match field.get(c) {
                    Some(v) if v == Vec2::ZERO => 'G',
                    Some(v) if v.x > 0.0 => '>',
                    Some(v) if v.x < 0.0 => '<',
                    Some(v) if v.y > 0.0 => 'v',
                    Some(_) => '^',
                    None => ' ',
                }
            })
            .collect();
        println!("{row}");
    }
}
