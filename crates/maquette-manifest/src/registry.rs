//! Built-in registry of educational models.
//!
//! Priority order mirrors the landing page card order, with complementary
//! models (stator after rotor, RNA after DNA) kept adjacent so that viewing
//! one warms the other.

use crate::manifest::ModelManifest;

pub(crate) fn default_registry() -> ModelManifest {
    ModelManifest::builder()
        .model(
            "induction-motor-rotor",
            "induction motor/models/rotar.glb",
            1,
            4.5,
            "electrical",
        )
        .model(
            "induction-motor-stator",
            "induction motor/models/stator.glb",
            2,
            5.1,
            "electrical",
        )
        .model(
            "insulator-pin",
            "Insulators/models/Pin Insulator.glb",
            3,
            2.3,
            "electrical",
        )
        .model(
            "insulator-suspension",
            "Insulators/models/Suspension Insulator.glb",
            4,
            3.4,
            "electrical",
        )
        .model(
            "transformer",
            "transformer/models/high_voltage_power_transformer.glb",
            5,
            7.9,
            "electrical",
        )
        .model(
            "dc-motor",
            "dc motor/models/model_of_dc_motor_working_principle.glb",
            6,
            9.1,
            "electrical",
        )
        .model(
            "galvanometer",
            "galvanometer/models/moving_coil_galvanometer.glb",
            7,
            3.7,
            "electrical",
        )
        .model("multimeter", "multimeter/models/multimeter.glb", 8, 6.8, "electrical")
        .model("atom", "atom/models/atom.glb", 9, 2.5, "science")
        .model("cells-human", "cells/models/human_cell.glb", 10, 5.3, "biology")
        .model(
            "cells-plant",
            "cells/models/plant_cell_organelles.glb",
            11,
            4.8,
            "biology",
        )
        .model(
            "cells-animal",
            "cells/models/animal_cell_-_downloadable.glb",
            12,
            4.2,
            "biology",
        )
        .model("dna", "dna & rna/models/dna.glb", 13, 3.1, "biology")
        .model("rna", "dna & rna/models/rna.glb", 14, 2.8, "biology")
        .model(
            "digestive-system",
            "digestive system/models/digestive_organs.glb",
            15,
            12.3,
            "biology",
        )
        .model("neuron", "neuron/models/neuron.glb", 16, 6.4, "biology")
        .model(
            "solar-system",
            "solar system/models/solar_system.glb",
            17,
            15.2,
            "science",
        )
        .model("water-cycle", "water cycle/models/water_cycle.glb", 18, 8.7, "environmental")
        .model(
            "induction-motor-torus1",
            "induction motor/models/torus1.glb",
            19,
            2.1,
            "electrical",
        )
        .model(
            "induction-motor-torus2",
            "induction motor/models/torus2.glb",
            20,
            2.1,
            "electrical",
        )
        .model(
            "induction-motor-torus3",
            "induction motor/models/torus3.glb",
            21,
            2.1,
            "electrical",
        )
        .build()
        .expect("built-in registry has unique keys")
}
