use crate::bounding_box::BoundingBox;
use crate::cell::{Cell, CellInstance, Fill, ParentCell};
use crate::config::Config;
use crate::error::{GeometryError, Result};
use crate::lattice::Lattice;
use crate::surface::Surface;
use crate::universe::Universe;
use std::collections::{HashMap, HashSet};

/// Where a point ends up after walking down from the root universe
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    /// Enclosing cells from the root downward
    pub parents: Vec<ParentCell>,
    /// Material-filled cell containing the point
    pub cell: usize,
    pub instance: usize,
    /// Position and direction in the frame of the innermost universe
    pub position: [f64; 3],
    pub direction: [f64; 3],
}

/// Geometry is the arena of surfaces, cells, universes and lattices for
/// Monte Carlo transport. Everything refers to everything else by index.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub surfaces: Vec<Surface>,
    pub cells: Vec<Cell>,
    pub universes: Vec<Universe>,
    pub lattices: Vec<Lattice>,
    pub root_universe: usize,
    cell_map: HashMap<u32, usize>,
    /// `universe_counts[u][t]`: occurrences of universe `t` at or below `u`
    universe_counts: Vec<Vec<usize>>,
}

impl Geometry {
    /// Validate the definition, attach cells to their universes and prepare
    /// the distribcell offset tables.
    pub fn new(
        surfaces: Vec<Surface>,
        mut universes: Vec<Universe>,
        cells: Vec<Cell>,
        lattices: Vec<Lattice>,
        root_universe: usize,
    ) -> Result<Self> {
        if root_universe >= universes.len() {
            return Err(GeometryError::Construction(format!(
                "root universe index {} out of range ({} universes)",
                root_universe,
                universes.len()
            )));
        }

        let mut used_surface_ids = HashSet::new();
        for surface in &surfaces {
            if !used_surface_ids.insert(surface.surface_id) {
                return Err(GeometryError::Construction(format!(
                    "Duplicate surface_id {} found. All surface IDs must be unique.",
                    surface.surface_id
                )));
            }
        }

        let mut used_universe_ids = HashSet::new();
        for universe in &universes {
            if !used_universe_ids.insert(universe.universe_id) {
                return Err(GeometryError::Construction(format!(
                    "Duplicate universe_id {} found. All universe IDs must be unique.",
                    universe.universe_id
                )));
            }
        }

        let mut cell_map = HashMap::new();
        for (index, cell) in cells.iter().enumerate() {
            if cell_map.insert(cell.cell_id, index).is_some() {
                return Err(GeometryError::Construction(format!(
                    "Duplicate cell_id {} found. All cell IDs must be unique.",
                    cell.cell_id
                )));
            }
            if cell.universe >= universes.len() {
                return Err(GeometryError::Construction(format!(
                    "cell {} belongs to missing universe index {}",
                    cell.cell_id, cell.universe
                )));
            }
            let fill_ok = match &cell.fill {
                Fill::Material(materials) => !materials.is_empty(),
                Fill::Universe(u) => *u < universes.len(),
                Fill::Lattice(l) => *l < lattices.len(),
            };
            if !fill_ok {
                return Err(GeometryError::Construction(format!(
                    "cell {} has an invalid fill {:?}",
                    cell.cell_id, cell.fill
                )));
            }
            for token in cell.region.halfspaces() {
                if token.unsigned_abs() as usize > surfaces.len() {
                    return Err(GeometryError::Construction(format!(
                        "cell {} references surface {} but only {} surfaces exist",
                        cell.cell_id,
                        token.unsigned_abs(),
                        surfaces.len()
                    )));
                }
            }
        }

        for lattice in &lattices {
            if let Some(u) = lattice.universes.iter().find(|&&u| u >= universes.len()) {
                return Err(GeometryError::Construction(format!(
                    "lattice {} references missing universe index {}",
                    lattice.lattice_id, u
                )));
            }
        }

        for universe in universes.iter_mut() {
            universe.cells.clear();
        }
        for (index, cell) in cells.iter().enumerate() {
            universes[cell.universe].cells.push(index);
        }

        let mut geometry = Geometry {
            surfaces,
            cells,
            universes,
            lattices,
            root_universe,
            cell_map,
            universe_counts: Vec::new(),
        };
        geometry.check_acyclic()?;
        geometry.prepare_distribcell();
        Ok(geometry)
    }

    /// Universes directly nested in `universe` through its cells' fills
    fn children(&self, universe: usize) -> Vec<usize> {
        let mut children = Vec::new();
        for &index in &self.universes[universe].cells {
            match &self.cells[index].fill {
                Fill::Universe(u) => children.push(*u),
                Fill::Lattice(l) => children.extend(self.lattices[*l].universes.iter().copied()),
                Fill::Material(_) => {}
            }
        }
        children
    }

    fn check_acyclic(&self) -> Result<()> {
        fn visit(geometry: &Geometry, universe: usize, state: &mut [u8]) -> Result<()> {
            match state[universe] {
                1 => {
                    return Err(GeometryError::Construction(format!(
                        "universe {} is nested inside itself",
                        geometry.universes[universe].universe_id
                    )))
                }
                2 => return Ok(()),
                _ => {}
            }
            state[universe] = 1;
            for child in geometry.children(universe) {
                visit(geometry, child, state)?;
            }
            state[universe] = 2;
            Ok(())
        }

        let mut state = vec![0u8; self.universes.len()];
        for universe in 0..self.universes.len() {
            visit(self, universe, &mut state)?;
        }
        Ok(())
    }

    fn count_below(&self, universe: usize, memo: &mut Vec<Option<Vec<usize>>>) {
        if memo[universe].is_some() {
            return;
        }
        let mut counts = vec![0usize; self.universes.len()];
        counts[universe] = 1;
        for child in self.children(universe) {
            self.count_below(child, memo);
            if let Some(child_counts) = &memo[child] {
                for (total, n) in counts.iter_mut().zip(child_counts) {
                    *total += n;
                }
            }
        }
        memo[universe] = Some(counts);
    }

    /// Count instances of every cell and fill the offset tables that map a
    /// parent chain to an instance number.
    fn prepare_distribcell(&mut self) {
        let mut memo = vec![None; self.universes.len()];
        for universe in 0..self.universes.len() {
            self.count_below(universe, &mut memo);
        }
        self.universe_counts = memo.into_iter().map(Option::unwrap_or_default).collect();
        let counts = &self.universe_counts;

        // One offset row per universe holding reachable cells
        let root = self.root_universe;
        let mut targets: Vec<usize> = Vec::new();
        for cell in self.cells.iter_mut() {
            cell.n_instances = counts[root][cell.universe];
            cell.offset.clear();
            cell.distribcell_index = if cell.n_instances > 0 {
                let row = match targets.iter().position(|&t| t == cell.universe) {
                    Some(row) => row,
                    None => {
                        targets.push(cell.universe);
                        targets.len() - 1
                    }
                };
                Some(row)
            } else {
                None
            };
        }

        // Offsets inside a lattice start from zero; the cell holding the
        // lattice carries the offset of the lattice as a whole.
        let mut lattice_offsets: Vec<Vec<Vec<usize>>> = Vec::with_capacity(self.lattices.len());
        let mut lattice_totals: Vec<Vec<usize>> = Vec::with_capacity(self.lattices.len());
        for lattice in &self.lattices {
            let mut offsets = Vec::with_capacity(targets.len());
            let mut totals = Vec::with_capacity(targets.len());
            for &target in &targets {
                let mut running = 0;
                let row: Vec<usize> = lattice
                    .universes
                    .iter()
                    .map(|&u| {
                        let offset = running;
                        running += counts[u][target];
                        offset
                    })
                    .collect();
                offsets.push(row);
                totals.push(running);
            }
            lattice_offsets.push(offsets);
            lattice_totals.push(totals);
        }

        let mut cell_offsets: Vec<Vec<usize>> = vec![Vec::new(); self.cells.len()];
        for universe in &self.universes {
            for (d, &target) in targets.iter().enumerate() {
                let mut offset = 0;
                for &index in &universe.cells {
                    let increment = match &self.cells[index].fill {
                        Fill::Universe(u) => counts[*u][target],
                        Fill::Lattice(l) => lattice_totals[*l][d],
                        Fill::Material(_) => continue,
                    };
                    let table = &mut cell_offsets[index];
                    if table.is_empty() {
                        table.resize(targets.len(), 0);
                    }
                    table[d] = offset;
                    offset += increment;
                }
            }
        }

        for (cell, offsets) in self.cells.iter_mut().zip(cell_offsets) {
            cell.offset = offsets;
        }
        for (lattice, offsets) in self.lattices.iter_mut().zip(lattice_offsets) {
            lattice.offsets = offsets;
        }
        tracing::debug!(
            distribcells = targets.len(),
            lattices = self.lattices.len(),
            "prepared distribcell offsets"
        );
    }

    /// Map an external cell id to its index in `cells`
    pub fn cell_index(&self, cell_id: u32) -> Result<usize> {
        self.cell_map
            .get(&cell_id)
            .copied()
            .ok_or_else(|| GeometryError::NotFound(format!("no cell with id {}", cell_id)))
    }

    fn cell(&self, index: usize) -> Result<&Cell> {
        self.cells
            .get(index)
            .ok_or_else(|| GeometryError::NotFound(format!("no cell at index {}", index)))
    }

    /// Number of times `target` appears at or below `universe`
    pub fn count_universe_instances(&self, universe: usize, target: usize) -> usize {
        self.universe_counts
            .get(universe)
            .and_then(|row| row.get(target))
            .copied()
            .unwrap_or(0)
    }

    pub fn cell_bounding_box(&self, index: usize) -> Result<BoundingBox> {
        Ok(self.cell(index)?.bounding_box(&self.surfaces))
    }

    /// Instance number of a cell reached through the given chain of parents
    pub fn instance_from_path(&self, index: usize, parents: &[ParentCell]) -> Result<usize> {
        let d = self.cell(index)?.distribcell_index.ok_or_else(|| {
            GeometryError::NotFound(format!(
                "cell {} is not reachable from the root universe",
                self.cells[index].cell_id
            ))
        })?;
        let mut instance = 0;
        for link in parents {
            let parent = self.cell(link.cell_index)?;
            instance += parent.offset.get(d).copied().unwrap_or(0);
            if let (Some(element), Fill::Lattice(l)) = (link.lattice_index, &parent.fill) {
                instance += self.lattices[*l].offset(d, element);
            }
        }
        Ok(instance)
    }

    /// Find the cell of `universe` containing the point. Neighbors of the
    /// previously occupied cell are tried first and the list is extended on
    /// a miss.
    pub fn find_cell_in_universe(
        &self,
        universe: usize,
        point: [f64; 3],
        direction: [f64; 3],
        from: Option<usize>,
    ) -> Option<usize> {
        let previous = from.filter(|&p| self.cells.get(p).is_some_and(|c| c.universe == universe));
        if let Some(previous) = previous {
            for neighbor in self.cells[previous].neighbors.snapshot() {
                if self.cells[neighbor].contains(point, direction, 0, &self.surfaces) {
                    return Some(neighbor);
                }
            }
        }
        let found =
            self.universes
                .get(universe)?
                .find_cell(&self.cells, &self.surfaces, point, direction)?;
        if let Some(previous) = previous {
            if previous != found {
                self.cells[previous].neighbors.push(found);
            }
        }
        Some(found)
    }

    /// Walk from the root universe down to the material cell containing the
    /// point. Neighbor lists are neither read nor extended; see
    /// [`Geometry::relocate`].
    pub fn locate(&self, point: [f64; 3], direction: [f64; 3]) -> Option<Location> {
        self.walk(point, direction, None)
    }

    /// Locate a particle that has moved from `previous`. At every level the
    /// cell occupied before is used as the neighbor-list hint, so repeated
    /// crossings between the same cells skip the full universe scan.
    pub fn relocate(
        &self,
        point: [f64; 3],
        direction: [f64; 3],
        previous: &Location,
    ) -> Option<Location> {
        self.walk(point, direction, Some(previous))
    }

    fn walk(
        &self,
        point: [f64; 3],
        direction: [f64; 3],
        previous: Option<&Location>,
    ) -> Option<Location> {
        let mut parents = Vec::new();
        let mut universe = self.root_universe;
        let (mut r, mut u) = (point, direction);
        loop {
            let from = previous.and_then(|p| match p.parents.get(parents.len()) {
                Some(link) => Some(link.cell_index),
                None if p.parents.len() == parents.len() => Some(p.cell),
                None => None,
            });
            let index = self.find_cell_in_universe(universe, r, u, from)?;
            let cell = &self.cells[index];
            match &cell.fill {
                Fill::Material(_) => {
                    let instance = self.instance_from_path(index, &parents).ok()?;
                    return Some(Location {
                        parents,
                        cell: index,
                        instance,
                        position: r,
                        direction: u,
                    });
                }
                Fill::Universe(fill) => {
                    parents.push(ParentCell {
                        cell_index: index,
                        lattice_index: None,
                    });
                    (r, u) = cell.to_local(r, u);
                    universe = *fill;
                }
                Fill::Lattice(l) => {
                    (r, u) = cell.to_local(r, u);
                    let lattice = &self.lattices[*l];
                    let (element, local) = lattice.find_element(r)?;
                    parents.push(ParentCell {
                        cell_index: index,
                        lattice_index: Some(element),
                    });
                    r = local;
                    universe = lattice.universes[element];
                }
            }
        }
    }

    /// Find the first material cell containing the given point, or None if not found
    pub fn find_cell(&self, point: [f64; 3]) -> Option<&Cell> {
        self.locate(point, [0.0, 0.0, 1.0])
            .map(|location| &self.cells[location.cell])
    }

    fn check_instance(&self, index: usize, instance: usize) -> Result<()> {
        let cell = self.cell(index)?;
        if instance >= cell.n_instances {
            return Err(GeometryError::NotFound(format!(
                "cell {} has no instance {} ({} instances)",
                cell.cell_id, instance, cell.n_instances
            )));
        }
        Ok(())
    }

    /// Chain of enclosing cells for one instance of a cell, found by a single
    /// walk down from the root guided by a point inside that instance.
    ///
    /// The chain runs from the root downward and holds only the enclosing
    /// cells: the cell being resolved is not itself a link, so a cell of the
    /// root universe has an empty chain. A lattice link carries the flat
    /// index of the element entered.
    pub fn find_parent_cells(
        &self,
        index: usize,
        instance: usize,
        point: [f64; 3],
    ) -> Result<Vec<ParentCell>> {
        self.check_instance(index, instance)?;
        match self.locate(point, [0.0, 0.0, 1.0]) {
            Some(location) => self.find_parent_cells_from(index, instance, &location),
            None => {
                tracing::warn!(
                    cell_id = self.cells[index].cell_id,
                    instance,
                    "hint point is outside the geometry; searching exhaustively"
                );
                self.exhaustive_find_parent_cells(index, instance)
            }
        }
    }

    /// Same as [`Geometry::find_parent_cells`] for a point that has already
    /// been located, e.g. by a particle in flight.
    pub fn find_parent_cells_from(
        &self,
        index: usize,
        instance: usize,
        location: &Location,
    ) -> Result<Vec<ParentCell>> {
        self.check_instance(index, instance)?;
        let candidate = if location.cell == index {
            Some(location.parents.clone())
        } else {
            location
                .parents
                .iter()
                .position(|p| p.cell_index == index)
                .map(|k| location.parents[..k].to_vec())
        };
        if let Some(parents) = candidate {
            if self.instance_from_path(index, &parents)? == instance {
                return Ok(parents);
            }
        }
        tracing::warn!(
            cell_id = self.cells[index].cell_id,
            instance,
            "hint point does not lie in the requested instance; searching exhaustively"
        );
        self.exhaustive_find_parent_cells(index, instance)
    }

    /// Chain of enclosing cells for one instance of a cell, found by visiting
    /// every universe and lattice fill in order until the instance is reached.
    pub fn exhaustive_find_parent_cells(
        &self,
        index: usize,
        instance: usize,
    ) -> Result<Vec<ParentCell>> {
        self.check_instance(index, instance)?;
        let target = self.cells[index].universe;
        let mut parents = Vec::new();
        let mut counter = 0;
        if self.search_universe(self.root_universe, target, instance, &mut counter, &mut parents) {
            Ok(parents)
        } else {
            Err(GeometryError::NotFound(format!(
                "instance {} of cell {} not found in the geometry tree",
                instance, self.cells[index].cell_id
            )))
        }
    }

    fn search_universe(
        &self,
        universe: usize,
        target: usize,
        wanted: usize,
        counter: &mut usize,
        parents: &mut Vec<ParentCell>,
    ) -> bool {
        if universe == target {
            if *counter == wanted {
                return true;
            }
            *counter += 1;
            return false;
        }
        for &index in &self.universes[universe].cells {
            match &self.cells[index].fill {
                Fill::Material(_) => {}
                Fill::Universe(fill) => {
                    parents.push(ParentCell {
                        cell_index: index,
                        lattice_index: None,
                    });
                    if self.search_universe(*fill, target, wanted, counter, parents) {
                        return true;
                    }
                    parents.pop();
                }
                Fill::Lattice(l) => {
                    for (element, &fill) in self.lattices[*l].universes.iter().enumerate() {
                        parents.push(ParentCell {
                            cell_index: index,
                            lattice_index: Some(element),
                        });
                        if self.search_universe(fill, target, wanted, counter, parents) {
                            return true;
                        }
                        parents.pop();
                    }
                }
            }
        }
        false
    }

    /// All material-cell instances underneath one instance of a filled cell,
    /// keyed by cell index. A material-filled cell contains nothing.
    pub fn get_contained_cells(
        &self,
        index: usize,
        instance: usize,
        hint: Option<[f64; 3]>,
    ) -> Result<HashMap<usize, Vec<usize>>> {
        let mut contained = HashMap::new();
        if self.cell(index)?.fill.is_material() {
            return Ok(contained);
        }
        let mut parents = match hint {
            Some(point) => self.find_parent_cells(index, instance, point)?,
            None => self.exhaustive_find_parent_cells(index, instance)?,
        };
        let mut seen = HashSet::new();
        self.collect_contained(index, &mut parents, &mut contained, &mut seen)?;
        Ok(contained)
    }

    fn collect_contained(
        &self,
        index: usize,
        parents: &mut Vec<ParentCell>,
        contained: &mut HashMap<usize, Vec<usize>>,
        seen: &mut HashSet<CellInstance>,
    ) -> Result<()> {
        match &self.cells[index].fill {
            Fill::Material(_) => {
                let instance = self.instance_from_path(index, parents)?;
                if seen.insert(CellInstance {
                    index_cell: index,
                    instance,
                }) {
                    contained.entry(index).or_default().push(instance);
                }
            }
            Fill::Universe(fill) => {
                parents.push(ParentCell {
                    cell_index: index,
                    lattice_index: None,
                });
                for &child in &self.universes[*fill].cells {
                    self.collect_contained(child, parents, contained, seen)?;
                }
                parents.pop();
            }
            Fill::Lattice(l) => {
                for (element, &fill) in self.lattices[*l].universes.iter().enumerate() {
                    parents.push(ParentCell {
                        cell_index: index,
                        lattice_index: Some(element),
                    });
                    for &child in &self.universes[fill].cells {
                        self.collect_contained(child, parents, contained, seen)?;
                    }
                    parents.pop();
                }
            }
        }
        Ok(())
    }

    /// Set the temperature of a cell instance (or all instances).
    ///
    /// Cells without a material fill have no temperature of their own; with
    /// `set_contained` the write goes to every material cell instance they
    /// contain instead.
    pub fn set_temperature(
        &mut self,
        index: usize,
        temperature: f64,
        instance: Option<usize>,
        set_contained: bool,
    ) -> Result<()> {
        let cell = self.cell(index)?;
        if cell.fill.is_material() {
            return self.cells[index].set_temperature(temperature, instance);
        }
        if !set_contained {
            return Err(GeometryError::InvalidArgument(format!(
                "attempted to set the temperature of cell {} which is not filled by a material",
                cell.cell_id
            )));
        }
        Config::global().check_temperature(temperature)?;

        let instances: Vec<usize> = match instance {
            Some(i) => vec![i],
            None => (0..cell.n_instances).collect(),
        };
        let mut targets = Vec::new();
        for i in instances {
            for (contained, list) in self.get_contained_cells(index, i, None)? {
                targets.extend(list.into_iter().map(|k| (contained, k)));
            }
        }
        for (contained, k) in targets {
            self.cells[contained].set_temperature(temperature, Some(k))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounding_box::assert_corners;
    use crate::region::CsgRegion;

    fn material() -> Fill {
        Fill::Material(vec![Some(1)])
    }

    fn cell(id: u32, region: &str, universe: usize, fill: Fill) -> Cell {
        Cell::new(id, CsgRegion::parse(region).unwrap(), universe, fill, None)
    }

    /// Root: sphere filled with universe 1, which holds a small inner sphere
    fn nested() -> Geometry {
        let surfaces = vec![
            Surface::new_sphere(0.0, 0.0, 0.0, 10.0, 1),
            Surface::new_sphere(0.0, 0.0, 0.0, 1.0, 2),
        ];
        let universes = vec![Universe::new(0), Universe::new(1)];
        let cells = vec![
            cell(1, "-1", 0, Fill::Universe(1)),
            cell(2, "-2", 1, material()),
            cell(3, "2", 1, material()),
        ];
        Geometry::new(surfaces, universes, cells, vec![], 0).unwrap()
    }

    #[test]
    fn test_find_cell() {
        let geometry = nested();
        assert_eq!(geometry.find_cell([0.0, 0.0, 0.0]).unwrap().cell_id, 2);
        assert_eq!(geometry.find_cell([5.0, 0.0, 0.0]).unwrap().cell_id, 3);
        assert!(geometry.find_cell([50.0, 0.0, 0.0]).is_none());
    }

    #[test]
    fn test_universes_populated_and_counted() {
        let geometry = nested();
        assert_eq!(geometry.universes[0].cells, vec![0]);
        assert_eq!(geometry.universes[1].cells, vec![1, 2]);
        assert!(geometry.cells.iter().all(|c| c.n_instances == 1));
        assert_eq!(geometry.cells[1].distribcell_index, geometry.cells[2].distribcell_index);
        assert_eq!(geometry.cells[0].offset.len(), 2);
        assert_eq!(geometry.count_universe_instances(0, 1), 1);
        assert_eq!(geometry.cell_index(3).unwrap(), 2);
        assert!(matches!(geometry.cell_index(99), Err(GeometryError::NotFound(_))));
    }

    #[test]
    fn test_cell_id_validation() {
        let surfaces = vec![Surface::new_sphere(0.0, 0.0, 0.0, 2.0, 1)];
        let cells = vec![cell(1, "-1", 0, material()), cell(1, "1", 0, material())];
        let result = Geometry::new(surfaces, vec![Universe::new(0)], cells, vec![], 0);
        assert!(matches!(result, Err(GeometryError::Construction(_))));
    }

    #[test]
    fn test_missing_surface_rejected() {
        let surfaces = vec![Surface::new_sphere(0.0, 0.0, 0.0, 2.0, 1)];
        let cells = vec![cell(1, "-1 2", 0, material())];
        let result = Geometry::new(surfaces, vec![Universe::new(0)], cells, vec![], 0);
        assert!(matches!(result, Err(GeometryError::Construction(_))));
    }

    #[test]
    fn test_cycle_rejected() {
        let surfaces = vec![Surface::new_sphere(0.0, 0.0, 0.0, 2.0, 1)];
        let universes = vec![Universe::new(0), Universe::new(1)];
        let cells = vec![
            cell(1, "-1", 0, Fill::Universe(1)),
            cell(2, "-1", 1, Fill::Universe(0)),
        ];
        let result = Geometry::new(surfaces, universes, cells, vec![], 0);
        assert!(matches!(result, Err(GeometryError::Construction(_))));
    }

    #[test]
    fn test_unreachable_cell_has_no_instances() {
        let surfaces = vec![Surface::new_sphere(0.0, 0.0, 0.0, 2.0, 1)];
        let universes = vec![Universe::new(0), Universe::new(7)];
        let cells = vec![cell(1, "-1", 0, material()), cell(2, "-1", 1, material())];
        let geometry = Geometry::new(surfaces, universes, cells, vec![], 0).unwrap();
        assert_eq!(geometry.cells[1].n_instances, 0);
        assert_eq!(geometry.cells[1].distribcell_index, None);
        assert!(matches!(
            geometry.exhaustive_find_parent_cells(1, 0),
            Err(GeometryError::NotFound(_))
        ));
    }

    #[test]
    fn test_neighbor_list_populated_on_search() {
        let geometry = nested();
        assert!(geometry.cells[1].neighbors.is_empty());
        let found = geometry.find_cell_in_universe(1, [5.0, 0.0, 0.0], [1.0, 0.0, 0.0], Some(1));
        assert_eq!(found, Some(2));
        assert_eq!(geometry.cells[1].neighbors.snapshot(), vec![2]);
        // Second lookup is served from the neighbor list and adds nothing
        let found = geometry.find_cell_in_universe(1, [6.0, 0.0, 0.0], [1.0, 0.0, 0.0], Some(1));
        assert_eq!(found, Some(2));
        assert_eq!(geometry.cells[1].neighbors.len(), 1);
    }

    #[test]
    fn test_cell_bounding_box() {
        let geometry = nested();
        let bbox = geometry.cell_bounding_box(0).unwrap();
        assert_corners(&bbox, [-10.0; 3], [10.0; 3]);
        assert!(geometry.cell_bounding_box(10).is_err());
    }

    #[test]
    fn test_temperature_on_filled_cell_needs_set_contained() {
        let mut geometry = nested();
        assert!(matches!(
            geometry.set_temperature(0, 600.0, None, false),
            Err(GeometryError::InvalidArgument(_))
        ));
        geometry.set_temperature(0, 600.0, None, true).unwrap();
        for index in [1, 2] {
            let t = geometry.cells[index].temperature(None).unwrap();
            assert!((t - 600.0).abs() < 1e-9);
        }
    }
}
