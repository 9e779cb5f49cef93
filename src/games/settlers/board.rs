//! Hex board geometry.
//!
//! Pointy-top hexes in axial coordinates `(q, r)`. Every vertex is the top
//! (`N`) or bottom (`S`) corner of exactly one hex, so `(q, r, N|S)` names a
//! vertex uniquely and the board can be built by deduplicating corners.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::core::{EdgeId, GameRng, HexId, Resource, VertexId};

/// Terrain of one hex. `resource` is `None` for the desert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HexTile {
    pub resource: Option<Resource>,
    /// Dice number, 0 for the desert.
    pub number: u8,
}

/// Standard terrain mix for the 18 producing hexes.
const TERRAIN: [Resource; 18] = [
    Resource::Lumber,
    Resource::Lumber,
    Resource::Lumber,
    Resource::Lumber,
    Resource::Wool,
    Resource::Wool,
    Resource::Wool,
    Resource::Wool,
    Resource::Grain,
    Resource::Grain,
    Resource::Grain,
    Resource::Grain,
    Resource::Brick,
    Resource::Brick,
    Resource::Brick,
    Resource::Ore,
    Resource::Ore,
    Resource::Ore,
];

const NUMBERS: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

/// Dots on a number token: how many of the 36 rolls hit it.
#[must_use]
pub fn pips(number: u8) -> u8 {
    match number {
        2..=6 => number - 1,
        8..=12 => 13 - number,
        _ => 0,
    }
}

fn shuffle<T>(items: &mut [T], rng: &mut GameRng) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range_usize(0..i + 1);
        items.swap(i, j);
    }
}

/// Immutable board, shared by every state of a game.
#[derive(Clone, Debug)]
pub struct Board {
    hexes: Vec<HexTile>,
    hex_vertices: Vec<[VertexId; 6]>,
    vertex_hexes: Vec<SmallVec<[HexId; 3]>>,
    vertex_neighbors: Vec<SmallVec<[VertexId; 3]>>,
    vertex_edges: Vec<SmallVec<[EdgeId; 3]>>,
    edges: Vec<[VertexId; 2]>,
    desert: HexId,
}

impl Board {
    /// Generate a board of the given radius (1 = 7 hexes, 2 = 19 hexes)
    /// with terrain and numbers shuffled by `rng`.
    pub fn generate(radius: u8, rng: &mut GameRng) -> Self {
        assert!((1..=3).contains(&radius), "Board radius must be 1-3");
        let r = i8::try_from(radius).unwrap_or(3);

        let mut coords = Vec::new();
        for row in -r..=r {
            for q in -r..=r {
                if (q + row).abs() <= r {
                    coords.push((q, row));
                }
            }
        }

        let producing = coords.len() - 1;
        let mut terrain: Vec<Option<Resource>> = (0..producing).map(|i| Some(TERRAIN[i % TERRAIN.len()])).collect();
        terrain.push(None);
        shuffle(&mut terrain, rng);
        let mut numbers: Vec<u8> = (0..producing).map(|i| NUMBERS[i % NUMBERS.len()]).collect();
        shuffle(&mut numbers, rng);

        let mut numbers = numbers.into_iter();
        let mut desert = HexId(0);
        let hexes: Vec<HexTile> = terrain
            .into_iter()
            .enumerate()
            .map(|(i, resource)| match resource {
                Some(resource) => HexTile {
                    resource: Some(resource),
                    number: numbers.next().unwrap_or(0),
                },
                None => {
                    desert = HexId(i as u8);
                    HexTile {
                        resource: None,
                        number: 0,
                    }
                }
            })
            .collect();

        let mut vertex_ids: FxHashMap<(i8, i8, bool), VertexId> = FxHashMap::default();
        let mut vertex_hexes: Vec<SmallVec<[HexId; 3]>> = Vec::new();
        let mut hex_vertices = Vec::with_capacity(coords.len());

        for (h, &(q, r)) in coords.iter().enumerate() {
            // clockwise from the top corner
            let corners = [
                (q, r, true),
                (q + 1, r - 1, false),
                (q, r + 1, true),
                (q, r, false),
                (q - 1, r + 1, true),
                (q, r - 1, false),
            ];
            let mut ring = [VertexId(0); 6];
            for (slot, key) in ring.iter_mut().zip(corners) {
                let id = *vertex_ids.entry(key).or_insert_with(|| {
                    vertex_hexes.push(SmallVec::new());
                    VertexId((vertex_hexes.len() - 1) as u8)
                });
                vertex_hexes[id.0 as usize].push(HexId(h as u8));
                *slot = id;
            }
            hex_vertices.push(ring);
        }

        let vertex_count = vertex_hexes.len();
        let mut edge_ids: FxHashMap<(VertexId, VertexId), EdgeId> = FxHashMap::default();
        let mut edges = Vec::new();
        let mut vertex_neighbors = vec![SmallVec::new(); vertex_count];
        let mut vertex_edges = vec![SmallVec::new(); vertex_count];

        for ring in &hex_vertices {
            for i in 0..6 {
                let (a, b) = (ring[i], ring[(i + 1) % 6]);
                let key = if a < b { (a, b) } else { (b, a) };
                if edge_ids.contains_key(&key) {
                    continue;
                }
                let id = EdgeId(edges.len() as u8);
                edge_ids.insert(key, id);
                edges.push([key.0, key.1]);
                vertex_neighbors[a.0 as usize].push(b);
                vertex_neighbors[b.0 as usize].push(a);
                vertex_edges[a.0 as usize].push(id);
                vertex_edges[b.0 as usize].push(id);
            }
        }

        Self {
            hexes,
            hex_vertices,
            vertex_hexes,
            vertex_neighbors,
            vertex_edges,
            edges,
            desert,
        }
    }

    #[must_use]
    pub fn hex_count(&self) -> usize {
        self.hexes.len()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_hexes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn hex(&self, id: HexId) -> HexTile {
        self.hexes[id.0 as usize]
    }

    /// Where the robber starts.
    #[must_use]
    pub fn desert(&self) -> HexId {
        self.desert
    }

    pub fn hex_ids(&self) -> impl Iterator<Item = HexId> {
        (0..self.hexes.len() as u8).map(HexId)
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..self.vertex_count() as u8).map(VertexId)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> {
        (0..self.edges.len() as u8).map(EdgeId)
    }

    /// Corners of a hex, clockwise from the top.
    #[must_use]
    pub fn corners(&self, hex: HexId) -> &[VertexId; 6] {
        &self.hex_vertices[hex.0 as usize]
    }

    /// Hexes touching a vertex (1 to 3).
    #[must_use]
    pub fn hexes_at(&self, v: VertexId) -> &[HexId] {
        &self.vertex_hexes[v.0 as usize]
    }

    /// Vertices one edge away.
    #[must_use]
    pub fn neighbors(&self, v: VertexId) -> &[VertexId] {
        &self.vertex_neighbors[v.0 as usize]
    }

    /// Edges touching a vertex.
    #[must_use]
    pub fn edges_at(&self, v: VertexId) -> &[EdgeId] {
        &self.vertex_edges[v.0 as usize]
    }

    #[must_use]
    pub fn endpoints(&self, e: EdgeId) -> [VertexId; 2] {
        self.edges[e.0 as usize]
    }

    /// Total pips of the producing hexes around a vertex.
    #[must_use]
    pub fn vertex_pips(&self, v: VertexId) -> u8 {
        self.hexes_at(v).iter().map(|&h| pips(self.hex(h).number)).sum()
    }
}
