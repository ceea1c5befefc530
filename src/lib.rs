/*!
Builds a time-expanded multi-modal graph of a metropolitan bus network.

The pipeline has two stages, each with its own binary:

1. `nodegen` expands raw per-route JSON (variants, stop sequences, path
   polylines, timetables, trips) into the node table: one row per
   arrival/departure event, with timestamps derived from path geometry.
2. `linkgen` joins those events into the four legal transitions (riding,
   waiting, transferring, walking) and streams them to the link table.

Both tables are plain CSV so the downstream accessibility analysis can load
them with whatever it likes.
*/

pub mod config;
pub mod graph;
pub mod routes;
